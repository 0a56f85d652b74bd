//! Shared path helpers
//!
//! Source ids must be identical on every machine, so everything that turns a
//! filesystem path into an id goes through here.

use std::io;
use std::path::{Component, Path};

/// Convert a path under `root` into a `/`-separated source id.
///
/// Returns `Ok(None)` for the root itself and for paths outside `root`. A
/// component that is not valid UTF-8 is an `InvalidData` error: distinct
/// names must never collapse into the same id.
pub fn to_source_id(path: &Path, root: &Path) -> io::Result<Option<String>> {
    let relative = match path.strip_prefix(root) {
        Ok(relative) => relative,
        Err(_) => return Ok(None),
    };

    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(name) = component {
            match name.to_str() {
                Some(name) => parts.push(name),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("file name is not valid UTF-8: {}", name.to_string_lossy()),
                    ))
                }
            }
        }
    }

    Ok((!parts.is_empty()).then(|| parts.join("/")))
}

/// Best-effort id for error messages only; never used as a source identity
pub fn describe_source_id(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => {
            relative.to_string_lossy().replace('\\', "/")
        }
        _ => ".".to_string(),
    }
}

/// Normalize a caller-supplied relative path into a source id.
///
/// Accepts `\` or `/` separators and drops `.` segments; rejects absolute paths
/// and `..` so ids can never escape the project.
pub fn normalize_relative_id(raw: &str) -> Option<String> {
    let unified = raw.replace('\\', "/");
    if unified.starts_with('/') || Path::new(raw).is_absolute() {
        return None;
    }

    let mut parts = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Normalize a path for display (strip Windows long-path prefixes).
pub fn display_path(path: &Path) -> String {
    let path_str = path.to_string_lossy().to_string();
    #[cfg(windows)]
    {
        if let Some(stripped) = path_str.strip_prefix(r"\\?\UNC\") {
            return format!(r"\\{}", stripped);
        }
        if let Some(stripped) = path_str.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }
    path_str
}

/// Returns true if this path is a Windows reparse point (junction/symlink/mount point).
///
/// `walkdir` reports junctions as plain directories, so they are checked
/// separately to avoid walking into cycles.
pub fn is_windows_reparse_point(path: &Path) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x0400;
        if let Ok(meta) = std::fs::symlink_metadata(path) {
            return meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0;
        }
        false
    }
    #[cfg(not(windows))]
    {
        let _ = path;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_to_source_id() {
        let root = PathBuf::from("/work/app");
        assert_eq!(
            to_source_id(&root.join("ios").join("Podfile"), &root).unwrap(),
            Some("ios/Podfile".to_string())
        );
        assert_eq!(to_source_id(&root, &root).unwrap(), None);
        assert_eq!(to_source_id(Path::new("/elsewhere/file"), &root).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = PathBuf::from("/work/app");
        let path = root.join("assets").join(OsStr::from_bytes(b"a\xff"));
        let err = to_source_id(&path, &root).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(describe_source_id(path.parent().unwrap(), &root), "assets");
        assert_eq!(describe_source_id(&root, &root), ".");
    }

    #[test]
    fn test_normalize_relative_id() {
        assert_eq!(normalize_relative_id("./native//patch.diff"), Some("native/patch.diff".to_string()));
        assert_eq!(normalize_relative_id(r"android\app\build.gradle"), Some("android/app/build.gradle".to_string()));
        assert_eq!(normalize_relative_id("../outside"), None);
        assert_eq!(normalize_relative_id("/etc/passwd"), None);
        assert_eq!(normalize_relative_id("."), None);
    }

    #[test]
    fn test_regular_dir_is_not_reparse_point() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(!is_windows_reparse_point(temp_dir.path()));
    }
}
