//! Bounded-concurrency hashing of sources
//!
//! Each source is hashed on a dedicated rayon pool with exactly
//! `concurrent_io_limit` threads, so that is the ceiling on simultaneous
//! reads. File contents stream through a fixed buffer; memory use does not
//! grow with file size.

use crate::algorithm::HashAlgorithm;
use crate::error::{Error, Result};
use crate::fingerprint::{DebugInfo, HashResult};
use crate::options::Configuration;
use crate::patcher;
use crate::source::{Source, SourceBody};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, trace};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Settings the hash pipeline needs from a [`Configuration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashOptions {
    pub algorithm: HashAlgorithm,
    pub concurrent_io_limit: usize,
    pub enable_react_imports_patcher: bool,
    pub debug: bool,
}

impl From<&Configuration> for HashOptions {
    fn from(config: &Configuration) -> Self {
        Self {
            algorithm: config.hash_algorithm,
            concurrent_io_limit: config.concurrent_io_limit,
            enable_react_imports_patcher: config.enable_react_imports_patcher,
            debug: config.debug,
        }
    }
}

/// Hash every source, in no particular order.
///
/// The first unreadable source aborts the run: remaining work is abandoned
/// and its error, tagged with the source id, is returned.
pub fn hash_sources(sources: Vec<Source>, options: &HashOptions) -> Result<Vec<HashResult>> {
    debug!(
        sources = sources.len(),
        workers = options.concurrent_io_limit,
        algorithm = %options.algorithm,
        "hashing sources"
    );

    run_bounded(sources, options.concurrent_io_limit, |source| {
        hash_source(&source, options)
    })
}

/// Run `task` over `items` on a dedicated pool of exactly `limit` threads,
/// so no more than `limit` tasks are ever in flight.
fn run_bounded<T, R, F>(items: Vec<T>, limit: usize, task: F) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> Result<R> + Send + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(limit.max(1))
        .thread_name(|index| format!("fingerprint-io-{}", index))
        .build()?;

    pool.install(|| items.into_par_iter().map(&task).collect())
}

/// Hash a single source
pub fn hash_source(source: &Source, options: &HashOptions) -> Result<HashResult> {
    let algorithm = options.algorithm;
    let (hash, debug_info) = match &source.body {
        SourceBody::File(path) => {
            let patch = options.enable_react_imports_patcher && patcher::applies_to(&source.id);
            let hashed = if patch {
                hash_patched_file(path, algorithm)
            } else {
                hash_file(path, algorithm).map(|(hash, bytes)| (hash, bytes, false))
            };
            let (hash, bytes, patched) = hashed.map_err(|e| Error::io(source.id.as_str(), e))?;
            (hash, DebugInfo { bytes, patched })
        }
        SourceBody::Dir => (
            algorithm.hash_bytes(source.id.as_bytes()),
            DebugInfo {
                bytes: source.id.len() as u64,
                patched: false,
            },
        ),
        SourceBody::Contents(contents) => (
            algorithm.hash_bytes(contents.as_bytes()),
            DebugInfo {
                bytes: contents.len() as u64,
                patched: false,
            },
        ),
    };

    trace!(id = %source.id, hash = %hash, "hashed source");

    Ok(HashResult {
        source_type: source.source_type(),
        id: source.id.clone(),
        reason: source.reason.clone(),
        hash,
        debug_info: options.debug.then_some(debug_info),
    })
}

/// Stream a file into the digest. Returns the hex digest and byte count.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> io::Result<(String, u64)> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut digester = algorithm.digester();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        digester.update(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    Ok((digester.finalize(), total))
}

/// Stream a source file line by line, applying React import normalization.
///
/// Lines are read in chunks of at most one buffer; only a chunk that starts a
/// line is eligible for rewriting. Non-UTF-8 lines are hashed unmodified.
fn hash_patched_file(path: &Path, algorithm: HashAlgorithm) -> io::Result<(String, u64, bool)> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut digester = algorithm.digester();
    let mut line = Vec::new();
    let mut total = 0u64;
    let mut patched = false;
    let mut at_line_start = true;

    loop {
        line.clear();
        let read = (&mut reader)
            .take(READ_BUFFER_SIZE as u64)
            .read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }

        let rewritten = if at_line_start {
            std::str::from_utf8(&line).ok().and_then(patcher::patch_line)
        } else {
            None
        };
        match rewritten {
            Some(text) => {
                digester.update(text.as_bytes());
                total += text.len() as u64;
                patched = true;
            }
            None => {
                digester.update(&line);
                total += line.len() as u64;
            }
        }
        at_line_start = line.last() == Some(&b'\n');
    }

    Ok((digester.finalize(), total, patched))
}
