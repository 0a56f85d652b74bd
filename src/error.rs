//! Error types for fingerprint computation
//!
//! Configuration problems and I/O failures are fatal for a run. Failures of the
//! advisory project queries (workflow, framework version) never leave
//! normalization; they are logged and replaced with conservative defaults.

use crate::source::SourceType;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error returned by fingerprint operations
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A source could not be read during enumeration or hashing
    #[error("failed to read source `{id}`: {source}")]
    Io {
        id: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to start hashing workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn io(id: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            id: id.into(),
            source,
        }
    }

    /// Id of the offending source for I/O failures
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Error::Io { id, .. } => Some(id),
            Error::Configuration(_) | Error::WorkerPool(_) => None,
        }
    }
}

/// Invalid options, patterns, or config documents
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid ignore pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("unknown hash algorithm `{0}` (expected one of: sha1, sha256, sha512, md5, blake3)")]
    UnknownAlgorithm(String),

    #[error("concurrent I/O limit must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    #[error("invalid config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid extra source `{0}`: ids must be relative paths without `..`")]
    InvalidExtraSource(String),

    #[error("extra source id `{0}` is reserved for a built-in source")]
    ReservedSourceId(String),

    #[error("conflicting definitions for {} source `{id}`", .source_type.as_str())]
    ConflictingSource { source_type: SourceType, id: String },
}

/// Failure of an external project query (workflow classifier, version resolver)
#[derive(Debug, Error)]
pub enum ExternalQueryError {
    #[error("package `{0}` is not installed")]
    NotInstalled(String),

    #[error("invalid version data: {0}")]
    InvalidVersion(String),

    #[error("query failed: {0}")]
    Io(#[from] io::Error),
}
