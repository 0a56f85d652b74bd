// Shared fixtures for integration tests

#![allow(dead_code)]

use native_fingerprint::{
    compute_fingerprint_with, ExternalQueryError, Fingerprint, Options, Platform, Result,
    VersionResolver, Workflow, WorkflowClassifier,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Classifies every platform the same way
pub struct FixedWorkflow(pub Workflow);

impl WorkflowClassifier for FixedWorkflow {
    fn classify(&self, _: &Path, _: Platform) -> std::result::Result<Workflow, ExternalQueryError> {
        Ok(self.0)
    }
}

/// Behaves as if the framework package is not installed
pub struct NotInstalled;

impl VersionResolver for NotInstalled {
    fn satisfies(
        &self,
        _: &Path,
        package: &str,
        _: &str,
    ) -> std::result::Result<bool, ExternalQueryError> {
        Err(ExternalQueryError::NotInstalled(package.to_string()))
    }
}

/// Temporary project directory
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
        self
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.root().join(rel)).unwrap();
    }

    pub fn try_fingerprint(&self, options: &Options) -> Result<Fingerprint> {
        compute_fingerprint_with(
            self.root(),
            options,
            &FixedWorkflow(Workflow::Generic),
            &NotInstalled,
        )
    }

    pub fn fingerprint(&self, options: &Options) -> Fingerprint {
        self.try_fingerprint(options).unwrap()
    }
}

pub fn source_ids(fingerprint: &Fingerprint) -> Vec<String> {
    fingerprint
        .sources
        .iter()
        .map(|s| format!("{}:{}", s.source_type.as_str(), s.id))
        .collect()
}

pub fn ignoring(patterns: &[&str]) -> Options {
    Options {
        ignore_paths: Some(patterns.iter().map(|p| p.to_string()).collect()),
        ..Default::default()
    }
}
