//! Built-in option values and ignore tables

use crate::project::{Platform, Workflow};

/// Project-local config document
pub const CONFIG_FILE_NAME: &str = "fingerprint.config.toml";

/// Project-local ignore file, one pattern per line
pub const IGNORE_FILE_NAME: &str = ".fingerprintignore";

/// Framework package whose version decides the React imports patcher default
pub const FRAMEWORK_PACKAGE: &str = "expo";

/// Versions in this range still get the patcher by default
pub const REACT_IMPORTS_PATCHER_RANGE: &str = "<52.0.0";

/// Paths that never affect generated native code: build outputs, IDE state,
/// caches, VCS metadata, installed dependencies
pub const DEFAULT_IGNORE_PATHS: &[&str] = &[
    "**/android/build/**/*",
    "**/android/.cxx/**/*",
    "**/android/.gradle/**/*",
    "**/android/app/build/**/*",
    "**/android/local.properties",
    "**/android/.idea/**/*",
    "**/android/**/*.iml",
    "**/android/gradle/wrapper/gradle-wrapper.jar",
    "**/android/gradlew",
    "**/android/gradlew.bat",
    "**/ios/Pods/**/*",
    "**/ios/build/**/*",
    "**/ios/.xcode.env.local",
    "**/ios/**/project.xcworkspace/**/*",
    "**/ios/*.xcworkspace/xcuserdata/**/*",
    "**/ios/*.xcodeproj/xcuserdata/**/*",
    "**/ios/*.xcodeproj/project.xcworkspace/**/*",
    "**/.DS_Store",
    "**/*.log",
    ".git/**/*",
    ".expo/**/*",
    "node_modules/**/*",
    "dist/**/*",
    "web-build/**/*",
    "coverage/**/*",
    CONFIG_FILE_NAME,
    IGNORE_FILE_NAME,
];

/// Directories pruned regardless of path rules
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[".git", "node_modules", "**/ios/Pods"];

/// Lockfiles whose contents pin dependency versions
pub const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "bun.lock",
];

/// Ids of the logical contents sources derived from project manifests
pub const PACKAGE_JSON_DEPENDENCIES_ID: &str = "packageJson:dependencies";
pub const PACKAGE_JSON_SCRIPTS_ID: &str = "packageJson:scripts";
pub const EXPO_CONFIG_ID: &str = "expoConfig";

/// Contents ids that extra sources may not claim
pub const RESERVED_CONTENTS_IDS: &[&str] = &[
    PACKAGE_JSON_DEPENDENCIES_ID,
    PACKAGE_JSON_SCRIPTS_ID,
    EXPO_CONFIG_ID,
];

/// Manifest sections that identify installed dependencies
pub const PACKAGE_JSON_DEPENDENCY_KEYS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
    "resolutions",
    "overrides",
];

/// Extra path and dir rules for a platform in the given workflow.
///
/// A fully managed platform regenerates its native project, so the committed
/// copy (if any) is irrelevant.
pub fn workflow_excludes(platform: Platform, workflow: Workflow) -> (Vec<String>, Vec<String>) {
    match workflow {
        Workflow::Managed => {
            let dir = platform.dir_name();
            (vec![format!("{}/**/*", dir)], vec![dir.to_string()])
        }
        Workflow::Generic => (Vec::new(), Vec::new()),
    }
}

/// Default concurrent I/O limit: one hashing task per logical CPU
pub fn default_concurrent_io_limit() -> usize {
    num_cpus::get().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{compile, PatternKind, PatternOrigin};

    #[test]
    fn test_default_tables_compile() {
        assert!(compile(DEFAULT_IGNORE_PATHS, PatternKind::Path, PatternOrigin::Default).is_ok());
        assert!(compile(DEFAULT_IGNORE_DIRS, PatternKind::Dir, PatternOrigin::Default).is_ok());
    }

    #[test]
    fn test_managed_workflow_excludes() {
        let (paths, dirs) = workflow_excludes(Platform::Ios, Workflow::Managed);
        assert_eq!(paths, vec!["ios/**/*".to_string()]);
        assert_eq!(dirs, vec!["ios".to_string()]);

        let (paths, dirs) = workflow_excludes(Platform::Android, Workflow::Generic);
        assert!(paths.is_empty());
        assert!(dirs.is_empty());
    }

    #[test]
    fn test_default_concurrency_positive() {
        assert!(default_concurrent_io_limit() >= 1);
    }
}
