//! Native project fingerprinting
//!
//! Computes a deterministic digest over the inputs that affect a native app
//! build (sources, manifests, lockfiles, app config) so a cached build can be
//! reused exactly when none of them changed. The crate provides both a CLI
//! binary and a library API for programmatic use.

pub mod algorithm;
pub mod cli;
pub mod defaults;
pub mod diff;
pub mod error;
pub mod fingerprint;
pub mod hasher;
pub mod options;
pub mod output;
pub mod patcher;
pub mod patterns;
pub mod progress;
pub mod project;
pub mod scanner;
pub mod source;
pub mod theme;
pub mod utils;

pub use algorithm::HashAlgorithm;
pub use diff::Change;
pub use error::{ConfigurationError, Error, ExternalQueryError, Result};
pub use fingerprint::{Fingerprint, HashResult};
pub use options::{Configuration, Options, SourceSkip};
pub use project::{Platform, VersionResolver, Workflow, WorkflowClassifier};
pub use source::{ExtraSource, Source, SourceType};

use hasher::HashOptions;
use project::{FsWorkflowClassifier, NodeModulesVersionResolver};
use scanner::SourceEnumerator;
use std::path::Path;
use tracing::debug;

/// Fingerprint the project at `project_root`
pub fn compute_fingerprint(project_root: &Path, options: &Options) -> Result<Fingerprint> {
    compute_fingerprint_with(
        project_root,
        options,
        &FsWorkflowClassifier,
        &NodeModulesVersionResolver,
    )
}

/// Fingerprint the project using caller-supplied project queries
pub fn compute_fingerprint_with(
    project_root: &Path,
    options: &Options,
    classifier: &dyn WorkflowClassifier,
    resolver: &dyn VersionResolver,
) -> Result<Fingerprint> {
    let config = options::normalize_with(project_root, options, classifier, resolver)?;
    fingerprint_configured(&config)
}

/// Composite hash only
pub fn compute_project_hash(project_root: &Path, options: &Options) -> Result<String> {
    compute_fingerprint(project_root, options).map(|fingerprint| fingerprint.hash)
}

/// Changes from `previous` to `current`; empty iff the hashes are equal
pub fn diff_fingerprints(previous: &Fingerprint, current: &Fingerprint) -> Vec<Change> {
    diff::diff(previous, current)
}

/// Fingerprint the project now and diff it against `previous`.
///
/// Unless `options` says otherwise, the current fingerprint uses the
/// algorithm of `previous` so unchanged sources compare equal.
pub fn diff_against_project(
    previous: &Fingerprint,
    project_root: &Path,
    options: &Options,
) -> Result<Vec<Change>> {
    let mut options = options.clone();
    options.hash_algorithm.get_or_insert(previous.algorithm);
    let current = compute_fingerprint(project_root, &options)?;
    Ok(diff::diff(previous, &current))
}

fn fingerprint_configured(config: &Configuration) -> Result<Fingerprint> {
    let sources = SourceEnumerator::new(config).collect()?;
    debug!(
        root = %config.project_root.display(),
        sources = sources.len(),
        "enumerated sources"
    );

    let results = hasher::hash_sources(sources, &HashOptions::from(config))?;
    let fingerprint = fingerprint::aggregate(results, config.hash_algorithm);
    debug!(hash = %fingerprint.hash, "computed fingerprint");
    Ok(fingerprint)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::ExternalQueryError;
    use crate::options::{self, Configuration, Options};
    use crate::project::{Platform, VersionResolver, Workflow, WorkflowClassifier};
    use std::path::Path;

    pub struct GenericWorkflow;

    impl WorkflowClassifier for GenericWorkflow {
        fn classify(&self, _: &Path, _: Platform) -> Result<Workflow, ExternalQueryError> {
            Ok(Workflow::Generic)
        }
    }

    pub struct NoFramework;

    impl VersionResolver for NoFramework {
        fn satisfies(&self, _: &Path, package: &str, _: &str) -> Result<bool, ExternalQueryError> {
            Err(ExternalQueryError::NotInstalled(package.to_string()))
        }
    }

    /// Configuration for a generic project without the framework installed
    pub fn config_for(root: &Path, options: Options) -> Configuration {
        options::normalize_with(root, &options, &GenericWorkflow, &NoFramework).unwrap()
    }
}
