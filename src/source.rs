//! Hashing inputs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of a source; also the primary sort key of a fingerprint manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Contents,
    Dir,
    File,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Contents => "contents",
            SourceType::Dir => "dir",
            SourceType::File => "file",
        }
    }
}

/// What gets read when a source is hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceBody {
    /// File read from this absolute path
    File(PathBuf),
    /// Directory marker; only its id contributes
    Dir,
    /// In-memory canonical string
    Contents(String),
}

/// One unit of hashing input
///
/// `id` is a `/`-separated project-relative path or a logical key, never an
/// absolute path, so fingerprints compare across checkouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub reason: String,
    pub body: SourceBody,
}

impl Source {
    pub fn file(id: impl Into<String>, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
            body: SourceBody::File(path.into()),
        }
    }

    pub fn dir(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
            body: SourceBody::Dir,
        }
    }

    pub fn contents(
        id: impl Into<String>,
        contents: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
            body: SourceBody::Contents(contents.into()),
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self.body {
            SourceBody::File(_) => SourceType::File,
            SourceBody::Dir => SourceType::Dir,
            SourceBody::Contents(_) => SourceType::Contents,
        }
    }

    /// Identity used for ordering and deduplication
    pub fn key(&self) -> (SourceType, &str) {
        (self.source_type(), self.id.as_str())
    }
}

/// Caller-declared source added on top of the enumerated ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtraSource {
    /// Project-relative file, hashed by content
    File {
        path: String,
        reason: Option<String>,
    },
    /// Project-relative directory marker
    Dir {
        path: String,
        reason: Option<String>,
    },
    /// Literal contents under a logical id
    Contents {
        id: String,
        contents: String,
        reason: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_order_is_total_and_stable() {
        let mut types = vec![SourceType::File, SourceType::Contents, SourceType::Dir];
        types.sort();
        assert_eq!(types, vec![SourceType::Contents, SourceType::Dir, SourceType::File]);
    }

    #[test]
    fn test_key() {
        let source = Source::file("src/app.ts", "/tmp/project/src/app.ts", "file");
        assert_eq!(source.key(), (SourceType::File, "src/app.ts"));
        assert_eq!(Source::dir("src", "dir").source_type(), SourceType::Dir);
    }

    #[test]
    fn test_extra_source_toml_shape() {
        #[derive(Deserialize)]
        struct Doc {
            extra: Vec<ExtraSource>,
        }
        let doc: Doc = toml::from_str(
            r#"
            [[extra]]
            type = "contents"
            id = "env:API_URL"
            contents = "https://example.test"

            [[extra]]
            type = "file"
            path = "native/patch.diff"
            reason = "patch"
            "#,
        )
        .unwrap();
        assert_eq!(
            doc.extra[0],
            ExtraSource::Contents {
                id: "env:API_URL".to_string(),
                contents: "https://example.test".to_string(),
                reason: None,
            }
        );
        assert!(matches!(doc.extra[1], ExtraSource::File { ref reason, .. } if reason.as_deref() == Some("patch")));
    }
}
