//! Source enumeration
//!
//! Walks the project tree and adds the logical sources (dependency manifest,
//! lockfiles, app config, caller extras). Pruned directories are never read:
//! the dir rules are applied in `filter_entry`, before `walkdir` descends.

use crate::defaults::{
    EXPO_CONFIG_ID, LOCKFILES, PACKAGE_JSON_DEPENDENCIES_ID, PACKAGE_JSON_DEPENDENCY_KEYS,
    PACKAGE_JSON_SCRIPTS_ID,
};
use crate::error::{ConfigurationError, Error, Result};
use crate::options::{Configuration, SourceSkip};
use crate::source::{ExtraSource, Source, SourceType};
use crate::utils::{describe_source_id, is_windows_reparse_point, to_source_id};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, ErrorKind};
use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Enumerates the sources of one project under one configuration
pub struct SourceEnumerator<'a> {
    config: &'a Configuration,
}

impl<'a> SourceEnumerator<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Lazily yield every source. Each call starts a fresh walk.
    pub fn enumerate(&self) -> impl Iterator<Item = Result<Source>> + '_ {
        let logical = std::iter::once_with(move || self.logical_sources()).flat_map(|batch| {
            match batch {
                Ok(sources) => sources.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            }
        });
        logical.chain(self.walk())
    }

    /// Collect all sources, failing on the first error.
    ///
    /// Duplicate `(type, id)` pairs with the same body, e.g. a lockfile found
    /// both as a logical source and by the walk, collapse into one source whose
    /// reason lists every distinct reason in sorted order. Duplicates with
    /// different bodies are a configuration error. The result is sorted by key.
    pub fn collect(&self) -> Result<Vec<Source>> {
        let mut merged: BTreeMap<(SourceType, String), Source> = BTreeMap::new();

        for source in self.enumerate() {
            let source = source?;
            let key = (source.source_type(), source.id.clone());
            match merged.get_mut(&key) {
                Some(existing) if existing.body == source.body => {
                    existing.reason = merge_reasons(&existing.reason, &source.reason)
                }
                Some(_) => {
                    return Err(ConfigurationError::ConflictingSource {
                        source_type: key.0,
                        id: key.1,
                    }
                    .into())
                }
                None => {
                    merged.insert(key, source);
                }
            }
        }

        debug!(
            root = %self.config.project_root.display(),
            sources = merged.len(),
            "enumerated fingerprint sources"
        );
        Ok(merged.into_values().collect())
    }

    fn walk(&self) -> impl Iterator<Item = Result<Source>> + '_ {
        let root = self.config.project_root.as_path();
        WalkDir::new(root)
            .follow_links(false)
            .min_depth(1)
            .into_iter()
            .filter_entry(move |entry| self.should_descend(root, entry))
            .filter_map(move |entry| self.entry_to_source(root, entry).transpose())
    }

    /// Prune ignored directories before they are read
    fn should_descend(&self, root: &Path, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return true;
        }
        if is_windows_reparse_point(entry.path()) {
            return false;
        }
        // Unrepresentable names are reported by `entry_to_source`
        match to_source_id(entry.path(), root) {
            Ok(Some(id)) => !self.config.is_dir_pruned(&id),
            Ok(None) | Err(_) => true,
        }
    }

    fn entry_to_source(
        &self,
        root: &Path,
        entry: walkdir::Result<DirEntry>,
    ) -> Result<Option<Source>> {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let id = e
                    .path()
                    .map(|p| describe_source_id(p, root))
                    .unwrap_or_else(|| ".".to_string());
                let message = e.to_string();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(ErrorKind::Other, message));
                return Err(Error::io(id, source));
            }
        };

        let file_type = entry.file_type();
        // Symlinks may point outside the project or form cycles
        if file_type.is_symlink() {
            return Ok(None);
        }

        let id = match to_source_id(entry.path(), root) {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(None),
            Err(e) => {
                let parent = entry.path().parent().unwrap_or(root);
                return Err(Error::io(describe_source_id(parent, root), e));
            }
        };
        if self.config.is_path_ignored(&id) {
            return Ok(None);
        }

        if file_type.is_dir() {
            Ok(Some(Source::dir(id, "dir")))
        } else if file_type.is_file() {
            Ok(Some(Source::file(id, entry.into_path(), "file")))
        } else {
            Ok(None)
        }
    }

    /// Sources that are added regardless of path rules
    fn logical_sources(&self) -> Result<Vec<Source>> {
        let root = self.config.project_root.as_path();
        let mut sources = Vec::new();

        if let Some(manifest) = read_json(root, "package.json")? {
            let mut dependencies = serde_json::Map::new();
            for key in PACKAGE_JSON_DEPENDENCY_KEYS {
                if let Some(value) = manifest.get(*key) {
                    dependencies.insert((*key).to_string(), value.clone());
                }
            }
            sources.push(Source::contents(
                PACKAGE_JSON_DEPENDENCIES_ID,
                canonical_json(&Value::Object(dependencies)),
                "packageJson",
            ));

            if !self.config.skips(SourceSkip::PackageJsonScripts) {
                if let Some(scripts) = manifest.get("scripts") {
                    sources.push(Source::contents(
                        PACKAGE_JSON_SCRIPTS_ID,
                        canonical_json(scripts),
                        "packageJson",
                    ));
                }
            }
        }

        if !self.config.skips(SourceSkip::Lockfiles) {
            for name in LOCKFILES {
                let path = root.join(name);
                if path.is_file() {
                    sources.push(Source::file(*name, path, "lockfile"));
                }
            }
        }

        if !self.config.skips(SourceSkip::ExpoConfig) {
            if let Some(app) = read_json(root, "app.json")? {
                let config = match app.get("expo") {
                    Some(expo @ Value::Object(_)) => expo,
                    _ => &app,
                };
                sources.push(Source::contents(
                    EXPO_CONFIG_ID,
                    canonical_json(config),
                    "expoConfig",
                ));
            }
        }

        for extra in &self.config.extra_sources {
            sources.push(match extra {
                ExtraSource::File { path, reason } => Source::file(
                    path.as_str(),
                    root.join(path),
                    reason.as_deref().unwrap_or("extra"),
                ),
                ExtraSource::Dir { path, reason } => {
                    Source::dir(path.as_str(), reason.as_deref().unwrap_or("extra"))
                }
                ExtraSource::Contents {
                    id,
                    contents,
                    reason,
                } => Source::contents(
                    id.as_str(),
                    contents.as_str(),
                    reason.as_deref().unwrap_or("extra"),
                ),
            });
        }

        Ok(sources)
    }
}

/// Read and parse a JSON document at the project root; `None` if absent
fn read_json(root: &Path, name: &str) -> Result<Option<Value>> {
    let contents = match std::fs::read_to_string(root.join(name)) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(name, e)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| Error::io(name, io::Error::new(ErrorKind::InvalidData, e)))
}

/// Serialize JSON with object keys sorted at every level and no whitespace
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn merge_reasons(existing: &str, incoming: &str) -> String {
    let reasons: BTreeSet<&str> = existing.split(',').chain(incoming.split(',')).collect();
    reasons.into_iter().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::testing::config_for;
    use std::fs;
    use tempfile::TempDir;

    fn ids(sources: &[Source]) -> Vec<String> {
        sources
            .iter()
            .map(|s| format!("{}:{}", s.source_type().as_str(), s.id))
            .collect()
    }

    #[test]
    fn test_walk_yields_files_and_dirs() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("src/screens")).unwrap();
        fs::write(temp_dir.path().join("src/screens/Home.tsx"), "home").unwrap();
        fs::write(temp_dir.path().join("index.js"), "index").unwrap();

        let config = config_for(temp_dir.path(), Options::default());
        let sources = SourceEnumerator::new(&config).collect().unwrap();
        assert_eq!(
            ids(&sources),
            vec!["dir:src", "dir:src/screens", "file:index.js", "file:src/screens/Home.tsx"]
        );
    }

    #[test]
    fn test_path_rules_skip_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "1").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "2").unwrap();

        let config = config_for(
            temp_dir.path(),
            Options {
                ignore_paths: Some(vec!["b.txt".to_string()]),
                ..Default::default()
            },
        );
        let sources = SourceEnumerator::new(&config).collect().unwrap();
        assert_eq!(ids(&sources), vec!["file:a.txt"]);
    }

    #[test]
    fn test_dir_rules_prune_subtree() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("vendor/lib")).unwrap();
        fs::write(temp_dir.path().join("vendor/lib/code.c"), "int x;").unwrap();
        fs::write(temp_dir.path().join("main.c"), "int main;").unwrap();

        let config = config_for(
            temp_dir.path(),
            Options {
                ignore_dirs: Some(vec!["vendor".to_string()]),
                ..Default::default()
            },
        );
        let sources = SourceEnumerator::new(&config).collect().unwrap();
        assert_eq!(ids(&sources), vec!["file:main.c"]);
    }

    #[test]
    #[cfg(unix)]
    fn test_pruned_dir_is_never_read() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("secret.txt"), "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let config = config_for(
            temp_dir.path(),
            Options {
                ignore_dirs: Some(vec!["locked".to_string()]),
                ..Default::default()
            },
        );
        let result = SourceEnumerator::new(&config).collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_logical_sources() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{"name":"app","version":"1.0.0","scripts":{"start":"expo start"},"dependencies":{"react":"18.2.0","expo":"~51.0.0"}}"#,
        )
        .unwrap();
        fs::write(temp_dir.path().join("yarn.lock"), "# lock").unwrap();
        fs::write(
            temp_dir.path().join("app.json"),
            r#"{"expo":{"slug":"demo","name":"Demo"}}"#,
        )
        .unwrap();

        let config = config_for(
            temp_dir.path(),
            Options {
                ignore_paths: Some(vec!["*.json".to_string(), "yarn.lock".to_string()]),
                ..Default::default()
            },
        );
        let sources = SourceEnumerator::new(&config).collect().unwrap();
        assert_eq!(
            ids(&sources),
            vec![
                "contents:expoConfig",
                "contents:packageJson:dependencies",
                "contents:packageJson:scripts",
                "file:yarn.lock",
            ]
        );

        let deps = sources
            .iter()
            .find(|s| s.id == "packageJson:dependencies")
            .unwrap();
        assert_eq!(
            deps.body,
            crate::source::SourceBody::Contents(
                r#"{"dependencies":{"expo":"~51.0.0","react":"18.2.0"}}"#.to_string()
            )
        );
    }

    #[test]
    fn test_source_skips() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{"scripts":{"start":"x"}}"#,
        )
        .unwrap();
        fs::write(temp_dir.path().join("package-lock.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("app.json"), r#"{"name":"x"}"#).unwrap();

        let config = config_for(
            temp_dir.path(),
            Options {
                ignore_paths: Some(vec!["*.json".to_string()]),
                source_skips: Some(vec![
                    SourceSkip::PackageJsonScripts,
                    SourceSkip::Lockfiles,
                    SourceSkip::ExpoConfig,
                ]),
                ..Default::default()
            },
        );
        let sources = SourceEnumerator::new(&config).collect().unwrap();
        assert_eq!(ids(&sources), vec!["contents:packageJson:dependencies"]);
    }

    #[test]
    fn test_duplicate_sources_merge_reasons() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("yarn.lock"), "# lock").unwrap();

        let config = config_for(temp_dir.path(), Options::default());
        let sources = SourceEnumerator::new(&config).collect().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].reason, "file,lockfile");
    }

    #[test]
    fn test_extra_sources() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(
            temp_dir.path(),
            Options {
                extra_sources: Some(vec![
                    ExtraSource::Contents {
                        id: "env:API_URL".to_string(),
                        contents: "https://example.test".to_string(),
                        reason: None,
                    },
                    ExtraSource::Dir {
                        path: "native".to_string(),
                        reason: Some("plugin".to_string()),
                    },
                ]),
                ..Default::default()
            },
        );
        let sources = SourceEnumerator::new(&config).collect().unwrap();
        assert_eq!(ids(&sources), vec!["contents:env:API_URL", "dir:native"]);
        assert_eq!(sources[0].reason, "extra");
        assert_eq!(sources[1].reason, "plugin");
    }

    #[test]
    fn test_malformed_manifest_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), "{not json").unwrap();

        let config = config_for(temp_dir.path(), Options::default());
        let err = SourceEnumerator::new(&config).collect().unwrap_err();
        assert_eq!(err.source_id(), Some("package.json"));
    }

    #[test]
    fn test_enumeration_is_restartable() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "1").unwrap();

        let config = config_for(temp_dir.path(), Options::default());
        let enumerator = SourceEnumerator::new(&config);
        let first: Vec<_> = enumerator.enumerate().collect::<Result<_>>().unwrap();
        let second: Vec<_> = enumerator.enumerate().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value: Value = serde_json::from_str(r#"{"b":{"z":1,"a":[{"y":2,"x":1}]},"a":"s"}"#).unwrap();
        assert_eq!(canonical_json(&value), r#"{"a":"s","b":{"a":[{"x":1,"y":2}],"z":1}}"#);
    }

    #[test]
    fn test_conflicting_extra_definitions_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("fingerprint.config.toml"),
            "[[extraSources]]\ntype = \"contents\"\nid = \"env:API_URL\"\ncontents = \"v1\"\n",
        )
        .unwrap();

        let extra = |contents: &str| Options {
            extra_sources: Some(vec![ExtraSource::Contents {
                id: "env:API_URL".to_string(),
                contents: contents.to_string(),
                reason: None,
            }]),
            ..Default::default()
        };

        let config = config_for(temp_dir.path(), extra("v2"));
        let err = SourceEnumerator::new(&config).collect().unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::ConflictingSource { source_type: SourceType::Contents, ref id })
                if id == "env:API_URL"
        ));

        // Identical redeclaration is harmless
        let config = config_for(temp_dir.path(), extra("v1"));
        let sources = SourceEnumerator::new(&config).collect().unwrap();
        assert_eq!(ids(&sources), vec!["contents:env:API_URL"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_not_merged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("assets")).unwrap();
        let first = temp_dir.path().join("assets").join(OsStr::from_bytes(b"a\xff"));
        let second = temp_dir.path().join("assets").join(OsStr::from_bytes(b"a\xfe"));
        if fs::write(&first, "1").is_err() || fs::write(&second, "2").is_err() {
            // Filesystem insists on UTF-8 names
            return;
        }

        let config = config_for(temp_dir.path(), Options::default());
        let err = SourceEnumerator::new(&config).collect().unwrap_err();
        assert_eq!(err.source_id(), Some("assets"));
        assert!(matches!(err, Error::Io { ref source, .. } if source.kind() == ErrorKind::InvalidData));
    }
}
