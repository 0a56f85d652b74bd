//! Project queries consulted while normalizing options
//!
//! Both queries are advisory: callers fall back to conservative defaults when
//! they fail. The filesystem-backed implementations here are what the CLI and
//! `compute_fingerprint` use; tests and embedders can supply their own.

use crate::error::ExternalQueryError;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;

/// Native platforms whose project directories may be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

    /// Directory holding the native project, relative to the project root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

/// How a platform's native project is maintained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Workflow {
    /// Native project is committed and edited by hand
    Generic,
    /// Native project is regenerated from config and not committed
    Managed,
}

/// Classifies the workflow of one platform in a project
pub trait WorkflowClassifier: Send + Sync {
    fn classify(&self, project_root: &Path, platform: Platform)
        -> Result<Workflow, ExternalQueryError>;
}

/// Answers whether an installed package satisfies a semver range
pub trait VersionResolver: Send + Sync {
    fn satisfies(
        &self,
        project_root: &Path,
        package: &str,
        range: &str,
    ) -> Result<bool, ExternalQueryError>;
}

/// Detects the workflow from native project marker files
///
/// A platform is generic when its directory holds a native project and that
/// directory is not listed in the root `.gitignore`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsWorkflowClassifier;

impl WorkflowClassifier for FsWorkflowClassifier {
    fn classify(
        &self,
        project_root: &Path,
        platform: Platform,
    ) -> Result<Workflow, ExternalQueryError> {
        if !has_native_project(project_root, platform)? {
            return Ok(Workflow::Managed);
        }
        if is_gitignored(project_root, platform.dir_name())? {
            return Ok(Workflow::Managed);
        }
        Ok(Workflow::Generic)
    }
}

/// Check for the marker file of a platform's native project
fn has_native_project(project_root: &Path, platform: Platform) -> Result<bool, ExternalQueryError> {
    let dir = project_root.join(platform.dir_name());
    match platform {
        Platform::Android => Ok([
            "app/build.gradle",
            "app/build.gradle.kts",
            "settings.gradle",
            "settings.gradle.kts",
        ]
        .iter()
        .any(|marker| dir.join(marker).is_file())),
        Platform::Ios => {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                let name = entry?.file_name();
                if name.to_string_lossy().ends_with(".xcodeproj") {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Whether the root `.gitignore` excludes a top-level directory
fn is_gitignored(project_root: &Path, dir_name: &str) -> Result<bool, ExternalQueryError> {
    let contents = match std::fs::read_to_string(project_root.join(".gitignore")) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let mut ignored = false;
    for line in contents.lines().map(str::trim) {
        let (negate, entry) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        if entry.trim_matches('/') == dir_name {
            ignored = !negate;
        }
    }
    Ok(ignored)
}

/// Resolves installed versions from `node_modules/<package>/package.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeModulesVersionResolver;

#[derive(Deserialize)]
struct InstalledPackage {
    version: String,
}

impl VersionResolver for NodeModulesVersionResolver {
    fn satisfies(
        &self,
        project_root: &Path,
        package: &str,
        range: &str,
    ) -> Result<bool, ExternalQueryError> {
        let manifest = project_root
            .join("node_modules")
            .join(package)
            .join("package.json");
        let contents = match std::fs::read_to_string(&manifest) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ExternalQueryError::NotInstalled(package.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let installed: InstalledPackage = serde_json::from_str(&contents)
            .map_err(|e| ExternalQueryError::InvalidVersion(e.to_string()))?;
        let version = semver::Version::parse(&installed.version)
            .map_err(|e| ExternalQueryError::InvalidVersion(e.to_string()))?;
        let requirement = semver::VersionReq::parse(range)
            .map_err(|e| ExternalQueryError::InvalidVersion(e.to_string()))?;

        Ok(requirement.matches(&version))
    }
}
