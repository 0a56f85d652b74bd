//! Human and JSON rendering of fingerprints and diffs

use crate::diff::Change;
use crate::fingerprint::Fingerprint;
use crate::theme::Theme;
use serde::Serialize;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Only errors
    Normal,      // Standard output
    Verbose,     // More details
    VeryVerbose, // All details including per-source hashes
}

impl OutputMode {
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose >= 2 {
            OutputMode::VeryVerbose
        } else if verbose == 1 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }

    /// Default `tracing` filter directive for this mode
    pub fn log_level(&self) -> &'static str {
        match self {
            OutputMode::Quiet => "error",
            OutputMode::Normal => "warn",
            OutputMode::Verbose => "debug",
            OutputMode::VeryVerbose => "trace",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDiff<'a> {
    changed: bool,
    previous_hash: &'a str,
    current_hash: &'a str,
    changes: &'a [Change],
}

/// Print the composite hash, with the source list in verbose modes
pub fn print_fingerprint(fingerprint: &Fingerprint, mode: OutputMode) {
    // The hash is the result, so quiet mode still prints it
    if matches!(mode, OutputMode::Quiet | OutputMode::Normal) {
        println!("{}", fingerprint.hash);
        return;
    }

    println!();
    println!("{}", Theme::header("Project Fingerprint"));
    println!("{}", Theme::divider_bold(60));
    println!(
        "{:<12} {}",
        Theme::primary("Algorithm"),
        Theme::value(fingerprint.algorithm.as_str())
    );
    println!(
        "{:<12} {}",
        Theme::primary("Sources"),
        Theme::value(&fingerprint.sources.len().to_string())
    );
    println!("{:<12} {}", Theme::primary("Hash"), Theme::hash(&fingerprint.hash));
    println!("{}", Theme::divider(60));

    for source in &fingerprint.sources {
        if mode == OutputMode::VeryVerbose {
            println!(
                "{:<9} {} {} {}",
                source.source_type.as_str(),
                source.id,
                Theme::muted(&format!("({})", source.reason)),
                Theme::hash(&source.hash)
            );
        } else {
            println!("{:<9} {}", source.source_type.as_str(), source.id);
        }
    }
    println!();
}

pub fn print_fingerprint_json(fingerprint: &Fingerprint) -> anyhow::Result<()> {
    println!("{}", fingerprint.to_json_pretty()?);
    Ok(())
}

/// Print a diff for humans
pub fn print_diff(previous: &Fingerprint, current: &Fingerprint, changes: &[Change], mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    if changes.is_empty() {
        println!(
            "{} {}",
            Theme::success("Unchanged"),
            Theme::hash(&current.hash)
        );
        return;
    }

    println!(
        "{} {} -> {}",
        Theme::warning("Changed"),
        Theme::hash(&previous.hash),
        Theme::hash(&current.hash)
    );
    for change in changes {
        let line = change.to_string();
        let colored = match change {
            Change::Added { .. } => Theme::added(&line),
            Change::Removed { .. } => Theme::removed(&line),
            Change::Changed { .. } | Change::Composite { .. } => Theme::changed(&line),
        };
        println!("  {}", colored);

        if mode != OutputMode::Normal {
            if let Change::Changed {
                old_reason: Some(old),
                new_reason: Some(new),
                ..
            } = change
            {
                println!("    {}", Theme::muted(&format!("reason: {} -> {}", old, new)));
            }
        }
    }
}

pub fn print_diff_json(
    previous: &Fingerprint,
    current: &Fingerprint,
    changes: &[Change],
) -> anyhow::Result<()> {
    let json = JsonDiff {
        changed: !changes.is_empty(),
        previous_hash: &previous.hash,
        current_hash: &current.hash,
        changes,
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(true, 0), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(false, 0), OutputMode::Normal);
        assert_eq!(OutputMode::from_flags(false, 1), OutputMode::Verbose);
        assert_eq!(OutputMode::from_flags(false, 3), OutputMode::VeryVerbose);
        assert_eq!(OutputMode::Normal.log_level(), "warn");
    }
}
