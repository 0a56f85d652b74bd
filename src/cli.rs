//! Command-line interface

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::algorithm::HashAlgorithm;
use crate::diff;
use crate::fingerprint::Fingerprint;
use crate::options::Options;
use crate::output::{self, OutputMode};
use crate::progress;
use crate::utils::display_path;

#[derive(Parser)]
#[command(name = "native-fingerprint")]
#[command(version)]
#[command(about = "Deterministic fingerprints of native app projects")]
#[command(long_about = "Computes a hash over every input that affects a native build \
    (sources, manifests, lockfiles, app config) so cached builds can be reused \
    when nothing relevant changed.\n\n\
    Examples:\n  \
    native-fingerprint hash                         # Print the project hash\n  \
    native-fingerprint hash -o .fingerprint.json    # Save the full fingerprint\n  \
    native-fingerprint diff .fingerprint.json       # What changed since then\n  \
    native-fingerprint hash --ignore 'docs/**'      # Leave docs out")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the fingerprint of a project
    #[command(visible_alias = "h")]
    Hash {
        /// Project root
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,

        /// Digest algorithm (sha1, sha256, sha512, md5, blake3)
        #[arg(short = 'a', long, value_name = "ALGORITHM")]
        algorithm: Option<HashAlgorithm>,

        /// Maximum number of files hashed at once [default: logical CPUs]
        #[arg(short = 'c', long, value_name = "N")]
        concurrency: Option<usize>,

        /// Exclude paths matching pattern (repeatable, `!` to re-include)
        #[arg(long, value_name = "PATTERN")]
        ignore: Vec<String>,

        /// Skip directories matching pattern entirely (repeatable)
        #[arg(long, value_name = "PATTERN")]
        ignore_dir: Vec<String>,

        /// Record per-source diagnostics in the fingerprint
        #[arg(long)]
        debug: bool,

        /// Write the fingerprint as JSON to FILE
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the full fingerprint as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare a saved fingerprint with another one or with a project
    #[command(visible_alias = "d")]
    Diff {
        /// Previously saved fingerprint file
        #[arg(value_name = "PREVIOUS")]
        previous: PathBuf,

        /// Fingerprint file to compare against
        #[arg(value_name = "CURRENT", conflicts_with = "project")]
        current: Option<PathBuf>,

        /// Fingerprint this project instead [default: .]
        #[arg(long, value_name = "PATH")]
        project: Option<PathBuf>,

        /// Output results as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from_flags(self.quiet, self.verbose)
    }

    /// Run the command. Exit code 1 means the fingerprints differ.
    pub fn run(self) -> anyhow::Result<ExitCode> {
        let output_mode = self.output_mode();

        match self.command {
            Commands::Hash {
                path,
                algorithm,
                concurrency,
                ignore,
                ignore_dir,
                debug,
                output,
                json,
            } => {
                let options = Options {
                    hash_algorithm: algorithm,
                    concurrent_io_limit: concurrency,
                    ignore_paths: (!ignore.is_empty()).then_some(ignore),
                    ignore_dirs: (!ignore_dir.is_empty()).then_some(ignore_dir),
                    debug: debug.then_some(true),
                    ..Default::default()
                };
                let fingerprint = fingerprint_project(&path, &options, output_mode, json)?;

                if let Some(output) = output {
                    fingerprint.save(&output)?;
                }
                if json {
                    output::print_fingerprint_json(&fingerprint)?;
                } else {
                    output::print_fingerprint(&fingerprint, output_mode);
                }
                Ok(ExitCode::SUCCESS)
            }
            Commands::Diff {
                previous,
                current,
                project,
                json,
            } => {
                let previous = load_fingerprint(&previous)?;
                let current = match current {
                    Some(current) => load_fingerprint(&current)?,
                    None => {
                        let root = project.unwrap_or_else(|| PathBuf::from("."));
                        let options = Options {
                            hash_algorithm: Some(previous.algorithm),
                            ..Default::default()
                        };
                        fingerprint_project(&root, &options, output_mode, json)?
                    }
                };

                let changes = diff::diff(&previous, &current);
                if json {
                    output::print_diff_json(&previous, &current, &changes)?;
                } else {
                    output::print_diff(&previous, &current, &changes, output_mode);
                }

                if changes.is_empty() {
                    Ok(ExitCode::SUCCESS)
                } else {
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

fn fingerprint_project(
    root: &Path,
    options: &Options,
    output_mode: OutputMode,
    json: bool,
) -> anyhow::Result<Fingerprint> {
    let spinner = progress::spinner_for(
        &format!("Fingerprinting {}...", display_path(root)),
        output_mode != OutputMode::Quiet && !json,
    );
    let result = crate::compute_fingerprint(root, options);
    progress::finish_and_clear(&spinner);
    result.with_context(|| format!("Failed to fingerprint {}", display_path(root)))
}

fn load_fingerprint(path: &Path) -> anyhow::Result<Fingerprint> {
    let fingerprint = Fingerprint::load(path)?;
    if !fingerprint.is_consistent() {
        warn!(
            path = %display_path(path),
            "fingerprint hash does not match its sources; file may have been edited"
        );
    }
    Ok(fingerprint)
}
