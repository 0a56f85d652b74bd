//! Option normalization
//!
//! Produces the immutable [`Configuration`] for one run by layering, later
//! wins: built-in defaults, the project's `fingerprint.config.toml`, then the
//! caller's explicit [`Options`]. A `None` field means "no preference" and
//! falls through to the previous layer. Ignore patterns are concatenated
//! across layers rather than replaced.

use crate::algorithm::HashAlgorithm;
use crate::defaults::{self, CONFIG_FILE_NAME, IGNORE_FILE_NAME};
use crate::error::{ConfigurationError, Result};
use crate::patterns::{self, MatchObject, PatternKind, PatternOrigin};
use crate::project::{
    FsWorkflowClassifier, NodeModulesVersionResolver, Platform, VersionResolver, Workflow,
    WorkflowClassifier,
};
use crate::source::ExtraSource;
use crate::utils::normalize_relative_id;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Logical sources that can be left out of a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceSkip {
    /// `scripts` section of `package.json`
    PackageJsonScripts,
    /// Resolved app config from `app.json`
    ExpoConfig,
    /// Package manager lockfiles
    Lockfiles,
}

/// Caller overrides; also the schema of `fingerprint.config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    pub hash_algorithm: Option<HashAlgorithm>,
    pub concurrent_io_limit: Option<usize>,
    pub ignore_paths: Option<Vec<String>>,
    pub ignore_dirs: Option<Vec<String>>,
    pub enable_react_imports_patcher: Option<bool>,
    pub debug: Option<bool>,
    pub source_skips: Option<Vec<SourceSkip>>,
    pub extra_sources: Option<Vec<ExtraSource>>,
}

/// Fully resolved settings for one fingerprint run. Built once by
/// [`normalize`] and only ever borrowed afterwards.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub project_root: PathBuf,
    pub hash_algorithm: HashAlgorithm,
    pub concurrent_io_limit: usize,
    pub ignore_path_match_objects: Vec<MatchObject>,
    pub ignore_dir_match_objects: Vec<MatchObject>,
    pub enable_react_imports_patcher: bool,
    pub debug: bool,
    pub source_skips: BTreeSet<SourceSkip>,
    pub extra_sources: Vec<ExtraSource>,
    /// Workflow detected for each platform, in [`Platform::ALL`] order
    pub workflows: Vec<(Platform, Workflow)>,
}

impl Configuration {
    /// Whether a file or dir source with this id is excluded
    pub fn is_path_ignored(&self, id: &str) -> bool {
        patterns::is_ignored(&self.ignore_path_match_objects, id)
    }

    /// Whether the directory with this id is pruned from the walk
    pub fn is_dir_pruned(&self, id: &str) -> bool {
        patterns::is_ignored(&self.ignore_dir_match_objects, id)
    }

    pub fn skips(&self, skip: SourceSkip) -> bool {
        self.source_skips.contains(&skip)
    }
}

/// Normalize options using the filesystem-backed project queries
pub fn normalize(project_root: &Path, explicit: &Options) -> Result<Configuration> {
    normalize_with(
        project_root,
        explicit,
        &FsWorkflowClassifier,
        &NodeModulesVersionResolver,
    )
}

/// Normalize options with caller-supplied project queries
pub fn normalize_with(
    project_root: &Path,
    explicit: &Options,
    classifier: &dyn WorkflowClassifier,
    resolver: &dyn VersionResolver,
) -> Result<Configuration> {
    let file = load_config_file(project_root)?.unwrap_or_default();

    let hash_algorithm = explicit
        .hash_algorithm
        .or(file.hash_algorithm)
        .unwrap_or_default();

    let concurrent_io_limit = explicit
        .concurrent_io_limit
        .or(file.concurrent_io_limit)
        .unwrap_or_else(defaults::default_concurrent_io_limit);
    if concurrent_io_limit == 0 {
        return Err(ConfigurationError::InvalidConcurrency(0).into());
    }

    let debug = explicit.debug.or(file.debug).unwrap_or(false);

    let enable_react_imports_patcher = match explicit
        .enable_react_imports_patcher
        .or(file.enable_react_imports_patcher)
    {
        Some(enabled) => enabled,
        None => default_react_imports_patcher(project_root, resolver),
    };

    let workflows: Vec<(Platform, Workflow)> = Platform::ALL
        .iter()
        .map(|&platform| (platform, classify_workflow(project_root, platform, classifier)))
        .collect();

    // Path rules: defaults, workflow excludes, config file, ignore file, explicit
    let mut ignore_path_match_objects = patterns::compile(
        defaults::DEFAULT_IGNORE_PATHS,
        PatternKind::Path,
        PatternOrigin::Default,
    )?;
    let mut ignore_dir_match_objects = patterns::compile(
        defaults::DEFAULT_IGNORE_DIRS,
        PatternKind::Dir,
        PatternOrigin::Default,
    )?;

    for &(platform, workflow) in &workflows {
        let (paths, dirs) = defaults::workflow_excludes(platform, workflow);
        ignore_path_match_objects.extend(patterns::compile(
            &paths,
            PatternKind::Path,
            PatternOrigin::Workflow,
        )?);
        ignore_dir_match_objects.extend(patterns::compile(
            &dirs,
            PatternKind::Dir,
            PatternOrigin::Workflow,
        )?);
    }

    if let Some(paths) = &file.ignore_paths {
        ignore_path_match_objects.extend(patterns::compile(
            paths,
            PatternKind::Path,
            PatternOrigin::ConfigFile,
        )?);
    }
    ignore_path_match_objects.extend(patterns::compile(
        &load_ignore_file(project_root)?,
        PatternKind::Path,
        PatternOrigin::IgnoreFile,
    )?);
    if let Some(paths) = &explicit.ignore_paths {
        ignore_path_match_objects.extend(patterns::compile(
            paths,
            PatternKind::Path,
            PatternOrigin::Explicit,
        )?);
    }

    if let Some(dirs) = &file.ignore_dirs {
        ignore_dir_match_objects.extend(patterns::compile(
            dirs,
            PatternKind::Dir,
            PatternOrigin::ConfigFile,
        )?);
    }
    if let Some(dirs) = &explicit.ignore_dirs {
        ignore_dir_match_objects.extend(patterns::compile(
            dirs,
            PatternKind::Dir,
            PatternOrigin::Explicit,
        )?);
    }
    ignore_dir_match_objects.extend(patterns::derive_dir_rules(&ignore_path_match_objects));

    let source_skips: BTreeSet<SourceSkip> = file
        .source_skips
        .iter()
        .chain(explicit.source_skips.iter())
        .flatten()
        .copied()
        .collect();

    let extra_sources = file
        .extra_sources
        .iter()
        .chain(explicit.extra_sources.iter())
        .flatten()
        .map(validate_extra_source)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(
        algorithm = %hash_algorithm,
        concurrent_io_limit,
        path_rules = ignore_path_match_objects.len(),
        dir_rules = ignore_dir_match_objects.len(),
        enable_react_imports_patcher,
        "normalized fingerprint options"
    );

    Ok(Configuration {
        project_root: project_root.to_path_buf(),
        hash_algorithm,
        concurrent_io_limit,
        ignore_path_match_objects,
        ignore_dir_match_objects,
        enable_react_imports_patcher,
        debug,
        source_skips,
        extra_sources,
        workflows,
    })
}

/// Load `fingerprint.config.toml`; a missing file is not an error
fn load_config_file(project_root: &Path) -> Result<Option<Options>> {
    let path = project_root.join(CONFIG_FILE_NAME);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigurationError::Unreadable { path, source }.into()),
    };

    let options: Options = toml::from_str(&contents).map_err(|e| ConfigurationError::ConfigFile {
        path: path.clone(),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), "loaded fingerprint config file");
    Ok(Some(options))
}

/// Patterns from `.fingerprintignore`, skipping blank lines and `#` comments
fn load_ignore_file(project_root: &Path) -> Result<Vec<String>> {
    let path = project_root.join(IGNORE_FILE_NAME);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(ConfigurationError::Unreadable { path, source }.into()),
    };

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn classify_workflow(
    project_root: &Path,
    platform: Platform,
    classifier: &dyn WorkflowClassifier,
) -> Workflow {
    match classifier.classify(project_root, platform) {
        Ok(workflow) => workflow,
        Err(e) => {
            warn!(
                platform = platform.dir_name(),
                "workflow detection failed, assuming generic: {}", e
            );
            Workflow::Generic
        }
    }
}

fn default_react_imports_patcher(project_root: &Path, resolver: &dyn VersionResolver) -> bool {
    match resolver.satisfies(
        project_root,
        defaults::FRAMEWORK_PACKAGE,
        defaults::REACT_IMPORTS_PATCHER_RANGE,
    ) {
        Ok(satisfied) => satisfied,
        Err(e) => {
            debug!("framework version check failed, patcher disabled: {}", e);
            false
        }
    }
}

fn validate_extra_source(extra: &ExtraSource) -> std::result::Result<ExtraSource, ConfigurationError> {
    match extra {
        ExtraSource::File { path, reason } => normalize_relative_id(path)
            .map(|path| ExtraSource::File {
                path,
                reason: reason.clone(),
            })
            .ok_or_else(|| ConfigurationError::InvalidExtraSource(path.clone())),
        ExtraSource::Dir { path, reason } => normalize_relative_id(path)
            .map(|path| ExtraSource::Dir {
                path,
                reason: reason.clone(),
            })
            .ok_or_else(|| ConfigurationError::InvalidExtraSource(path.clone())),
        ExtraSource::Contents { id, .. } if id.trim().is_empty() => {
            Err(ConfigurationError::InvalidExtraSource(id.clone()))
        }
        ExtraSource::Contents { id, .. } if defaults::RESERVED_CONTENTS_IDS.contains(&id.as_str()) => {
            Err(ConfigurationError::ReservedSourceId(id.clone()))
        }
        ExtraSource::Contents { .. } => Ok(extra.clone()),
    }
}
