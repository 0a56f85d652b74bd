//! React imports normalization for Objective-C sources
//!
//! Older native templates import React headers with quotes
//! (`#import "RCTBridge.h"`), newer ones with the framework prefix
//! (`#import <React/RCTBridge.h>`). Rewriting the quoted form lets both hash
//! the same.

const PATCHED_EXTENSIONS: &[&str] = &["h", "m", "mm"];

/// Whether a file source is subject to the patcher
pub fn applies_to(id: &str) -> bool {
    if !id.starts_with("ios/") {
        return false;
    }
    match id.rsplit_once('.') {
        Some((_, ext)) => PATCHED_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Rewrite quoted React header imports. Line endings are preserved.
pub fn patch_react_imports(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        match patch_line(line) {
            Some(patched) => out.push_str(&patched),
            None => out.push_str(line),
        }
    }
    out
}

/// Rewrite one line (with its terminator) if it is a quoted React import
pub fn patch_line(line: &str) -> Option<String> {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, rest) = line.split_at(indent_len);
    let header = rest.strip_prefix("#import \"")?;
    let close = header.find('"')?;
    let (name, tail) = header.split_at(close);
    if !name.starts_with("RCT") || !name.ends_with(".h") || name.contains('/') {
        return None;
    }
    Some(format!("{}#import <React/{}>{}", indent, name, &tail[1..]))
}
