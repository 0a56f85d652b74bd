//! Fingerprint aggregation and persistence

use crate::algorithm::HashAlgorithm;
use crate::source::SourceType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Hash of one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashResult {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub id: String,
    pub reason: String,
    pub hash: String,
    /// Only present in debug runs; never part of the composite hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

impl HashResult {
    pub fn key(&self) -> (SourceType, &str) {
        (self.source_type, self.id.as_str())
    }
}

/// Diagnostics recorded for a source when `debug` is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    /// Bytes fed into the digest
    pub bytes: u64,
    /// Whether the React imports patcher rewrote the content
    pub patched: bool,
}

/// Composite fingerprint of a project
///
/// Two fingerprints are equal iff their `hash` fields are equal; `sources`
/// exists to explain differences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub algorithm: HashAlgorithm,
    pub hash: String,
    /// Sorted by `(type, id)`
    pub sources: Vec<HashResult>,
}

impl Fingerprint {
    /// Recompute the composite hash from `sources`
    pub fn composite_hash(&self) -> String {
        composite_hash(&self.sources, self.algorithm)
    }

    /// Whether `hash` agrees with the manifest, e.g. after loading from disk
    pub fn is_consistent(&self) -> bool {
        self.hash == self.composite_hash()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize fingerprint")
    }

    /// Write the fingerprint as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = self.to_json_pretty()?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write fingerprint to {}", path.display()))?;
        Ok(())
    }

    /// Read a fingerprint written by [`Fingerprint::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fingerprint file: {}", path.display()))?;
        let mut fingerprint: Fingerprint = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse fingerprint file: {}", path.display()))?;
        fingerprint
            .sources
            .sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(fingerprint)
    }
}

/// Sort per-source results and compute the composite digest
pub fn aggregate(mut results: Vec<HashResult>, algorithm: HashAlgorithm) -> Fingerprint {
    results.sort_by(|a, b| a.key().cmp(&b.key()));
    let hash = composite_hash(&results, algorithm);
    Fingerprint {
        algorithm,
        hash,
        sources: results,
    }
}

/// Digest over `(type, id, reason, hash)` of each result, in the given order.
///
/// Every field is length-prefixed so different splits of the same bytes
/// (id `a` + reason `bc` versus id `ab` + reason `c`) cannot collide. No
/// results gives the digest of empty input.
fn composite_hash(results: &[HashResult], algorithm: HashAlgorithm) -> String {
    let mut digester = algorithm.digester();
    for result in results {
        for field in [
            result.source_type.as_str(),
            result.id.as_str(),
            result.reason.as_str(),
            result.hash.as_str(),
        ] {
            digester.update(field.len().to_string().as_bytes());
            digester.update(b":");
            digester.update(field.as_bytes());
        }
    }
    digester.finalize()
}
