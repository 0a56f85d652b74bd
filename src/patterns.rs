//! Ignore rule compilation and matching
//!
//! Rules use glob syntax (`*` stays within one path segment, `**` spans any
//! number of segments) and a leading `!` negates. A candidate's status is
//! decided by the last rule that matches it, as with `.gitignore` files.

use crate::error::ConfigurationError;
use globset::{GlobBuilder, GlobMatcher};

/// What a rule is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Matched against file (and directory source) paths
    Path,
    /// Matched against directories; a hit prunes the whole subtree
    Dir,
}

/// Where a rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOrigin {
    Default,
    Workflow,
    ConfigFile,
    IgnoreFile,
    Explicit,
    /// Dir rule derived from a `prefix/**` path rule
    Derived,
}

/// A compiled ignore rule
#[derive(Debug, Clone)]
pub struct MatchObject {
    /// Pattern as written, without the `!` prefix
    pub pattern: String,
    pub negate: bool,
    pub kind: PatternKind,
    pub origin: PatternOrigin,
    matcher: GlobMatcher,
}

impl MatchObject {
    /// Whether this rule's glob matches a project-relative, `/`-separated path
    pub fn matches(&self, candidate: &str) -> bool {
        self.matcher.is_match(candidate)
    }
}

/// Compile raw patterns in declaration order
pub fn compile<S: AsRef<str>>(
    patterns: &[S],
    kind: PatternKind,
    origin: PatternOrigin,
) -> Result<Vec<MatchObject>, ConfigurationError> {
    patterns
        .iter()
        .map(|p| compile_one(p.as_ref(), kind, origin))
        .collect()
}

/// Compile a single raw pattern
pub fn compile_one(
    raw: &str,
    kind: PatternKind,
    origin: PatternOrigin,
) -> Result<MatchObject, ConfigurationError> {
    let (negate, pattern) = match raw.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let glob = normalize_glob(pattern, kind);
    let matcher = GlobBuilder::new(&glob)
        .literal_separator(true)
        .build()
        .map_err(|source| ConfigurationError::InvalidPattern {
            pattern: raw.to_string(),
            source,
        })?
        .compile_matcher();

    Ok(MatchObject {
        pattern: pattern.to_string(),
        negate,
        kind,
        origin,
        matcher,
    })
}

/// Rewrite a user pattern into the glob actually matched against relative paths
fn normalize_glob(pattern: &str, kind: PatternKind) -> String {
    let mut glob = pattern.trim();
    while let Some(rest) = glob.strip_prefix("./") {
        glob = rest;
    }
    let glob = glob.trim_start_matches('/');

    match kind {
        // `build/` means "everything under build"
        PatternKind::Path if glob.ends_with('/') => format!("{}**", glob),
        PatternKind::Dir => glob.trim_end_matches('/').to_string(),
        PatternKind::Path => glob.to_string(),
    }
}

/// Evaluate rules in order; the last matching rule decides
pub fn is_ignored(rules: &[MatchObject], candidate: &str) -> bool {
    let mut ignored = false;
    for rule in rules {
        if rule.matches(candidate) {
            ignored = !rule.negate;
        }
    }
    ignored
}

/// Derive subtree-pruning dir rules from `prefix/**` and `prefix/**/*` path rules.
///
/// A rule is only derived when no later negated path rule could re-include
/// something beneath `prefix`; otherwise files there must stay reachable.
pub fn derive_dir_rules(path_rules: &[MatchObject]) -> Vec<MatchObject> {
    let mut derived = Vec::new();

    for (index, rule) in path_rules.iter().enumerate() {
        if rule.negate {
            continue;
        }
        let glob = normalize_glob(&rule.pattern, PatternKind::Path);
        let prefix = match glob
            .strip_suffix("/**/*")
            .or_else(|| glob.strip_suffix("/**"))
        {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => continue,
        };

        let reopened = path_rules[index + 1..]
            .iter()
            .filter(|later| later.negate)
            .any(|later| may_reach_under(prefix, &later.pattern));
        if reopened {
            continue;
        }

        if let Ok(dir_rule) = compile_one(prefix, PatternKind::Dir, PatternOrigin::Derived) {
            derived.push(dir_rule);
        }
    }

    derived
}

/// Conservative check whether `negated` might match a path below `prefix`
fn may_reach_under(prefix: &str, negated: &str) -> bool {
    let negated = normalize_glob(negated, PatternKind::Path);
    let neg_head = literal_head(&negated);
    if neg_head.is_empty() {
        return true;
    }

    if literal_head(prefix) == prefix {
        return neg_head.starts_with(prefix) || prefix.starts_with(neg_head);
    }

    // Glob prefix: only a fully literal negation can be ruled out, by checking
    // whether any of its ancestors falls under the prefix
    if neg_head != negated {
        return true;
    }
    let prefix_matcher = match GlobBuilder::new(prefix).literal_separator(true).build() {
        Ok(glob) => glob.compile_matcher(),
        Err(_) => return true,
    };
    negated
        .match_indices('/')
        .any(|(index, _)| prefix_matcher.is_match(&negated[..index]))
}

/// Leading portion of a glob before the first metacharacter
fn literal_head(glob: &str) -> &str {
    let end = glob
        .find(|c| matches!(c, '*' | '?' | '[' | '{' | '\\'))
        .unwrap_or(glob.len());
    &glob[..end]
}
