//! Fingerprint comparison

use crate::fingerprint::{Fingerprint, HashResult};
use crate::source::SourceType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One difference between two fingerprints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Change {
    /// Source only in the current fingerprint
    Added {
        #[serde(rename = "type")]
        source_type: SourceType,
        id: String,
        hash: String,
    },
    /// Source only in the previous fingerprint
    Removed {
        #[serde(rename = "type")]
        source_type: SourceType,
        id: String,
        hash: String,
    },
    /// Source in both with a different hash or reason
    Changed {
        #[serde(rename = "type")]
        source_type: SourceType,
        id: String,
        old_hash: String,
        new_hash: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_reason: Option<String>,
    },
    /// Composite hashes differ although every manifest entry matches
    /// (different algorithms, or an edited record)
    Composite { old_hash: String, new_hash: String },
}

impl Change {
    /// Source id, if the change concerns a single source
    pub fn id(&self) -> Option<&str> {
        match self {
            Change::Added { id, .. } | Change::Removed { id, .. } | Change::Changed { id, .. } => {
                Some(id)
            }
            Change::Composite { .. } => None,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added { source_type, id, .. } => write!(f, "+ {} {}", source_type.as_str(), id),
            Change::Removed { source_type, id, .. } => {
                write!(f, "- {} {}", source_type.as_str(), id)
            }
            Change::Changed {
                source_type,
                id,
                old_hash,
                new_hash,
                ..
            } => write!(
                f,
                "~ {} {} ({} -> {})",
                source_type.as_str(),
                id,
                short(old_hash),
                short(new_hash)
            ),
            Change::Composite { old_hash, new_hash } => {
                write!(f, "~ composite ({} -> {})", short(old_hash), short(new_hash))
            }
        }
    }
}

/// First 12 characters; loaded records are not guaranteed to be hex
fn short(hash: &str) -> &str {
    match hash.char_indices().nth(12) {
        Some((end, _)) => &hash[..end],
        None => hash,
    }
}

/// Explain how `current` differs from `previous`.
///
/// Equal composite hashes always give an empty diff and unequal ones never
/// do. Both manifests are expected sorted by `(type, id)`, as produced by
/// aggregation and [`Fingerprint::load`], so one linear merge pass suffices.
pub fn diff(previous: &Fingerprint, current: &Fingerprint) -> Vec<Change> {
    if previous.hash == current.hash {
        return Vec::new();
    }

    let mut changes = Vec::new();
    let mut old_iter = previous.sources.iter().peekable();
    let mut new_iter = current.sources.iter().peekable();

    loop {
        let order = match (old_iter.peek(), new_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(old), Some(new)) => old.key().cmp(&new.key()),
        };

        match order {
            Ordering::Less => {
                if let Some(old) = old_iter.next() {
                    changes.push(removed(old));
                }
            }
            Ordering::Greater => {
                if let Some(new) = new_iter.next() {
                    changes.push(added(new));
                }
            }
            Ordering::Equal => {
                if let (Some(old), Some(new)) = (old_iter.next(), new_iter.next()) {
                    if let Some(change) = changed(old, new) {
                        changes.push(change);
                    }
                }
            }
        }
    }

    if changes.is_empty() {
        changes.push(Change::Composite {
            old_hash: previous.hash.clone(),
            new_hash: current.hash.clone(),
        });
    }
    changes
}

fn added(result: &HashResult) -> Change {
    Change::Added {
        source_type: result.source_type,
        id: result.id.clone(),
        hash: result.hash.clone(),
    }
}

fn removed(result: &HashResult) -> Change {
    Change::Removed {
        source_type: result.source_type,
        id: result.id.clone(),
        hash: result.hash.clone(),
    }
}

fn changed(old: &HashResult, new: &HashResult) -> Option<Change> {
    let reason_changed = old.reason != new.reason;
    if old.hash == new.hash && !reason_changed {
        return None;
    }
    Some(Change::Changed {
        source_type: new.source_type,
        id: new.id.clone(),
        old_hash: old.hash.clone(),
        new_hash: new.hash.clone(),
        old_reason: reason_changed.then(|| old.reason.clone()),
        new_reason: reason_changed.then(|| new.reason.clone()),
    })
}
