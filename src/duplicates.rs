//! Content fingerprinting and duplicate destination resolution.
//!
//! When a file's destination already exists, the two candidates are compared
//! by content hash and the configured policy decides the outcome: overwrite
//! the existing file, skip the move, or probe the rename pattern for a free
//! name.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use tracing::warn;

use crate::config::DuplicateHandling;

/// Files larger than this have only their leading bytes fingerprinted.
pub const FINGERPRINT_LIMIT: u64 = 10 * 1024 * 1024;

/// Counter values probed before giving up on renaming.
pub const MAX_RENAME_ATTEMPTS: u32 = 1000;

/// Content fingerprint of a file: a BLAKE3 hash over at most the first
/// 10 MiB. Bounding the read keeps comparison of very large files cheap at
/// the cost of treating files with identical 10 MiB prefixes as equal.
pub fn fingerprint(path: &Path) -> io::Result<blake3::Hash> {
    let file = File::open(path)?;
    let mut reader = file.take(FINGERPRINT_LIMIT);
    let mut hasher = Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Outcome of duplicate resolution for one candidate destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Final path to move to, or `None` to skip the move entirely.
    pub destination: Option<PathBuf>,
    /// The source and the existing destination had matching fingerprints.
    pub identical: bool,
}

/// Decides the final destination for a move whose target may already exist.
///
/// A free target is returned unchanged. Otherwise both files are
/// fingerprinted (the result is informational, recorded in `identical`) and
/// the policy picks the outcome:
///
/// - `Overwrite` keeps the target path, replacing the existing file on move.
/// - `Skip` returns no destination.
/// - `Rename` substitutes `{name}`, `{counter}` (as `_1`, `_2`, ...) and
///   `{ext}` into `pattern` until a free path turns up. After
///   [`MAX_RENAME_ATTEMPTS`] probes the collision is reported and the move
///   is skipped.
///
/// # Errors
///
/// Fingerprinting reads both files, so an unreadable source or target
/// surfaces as an I/O error.
pub fn resolve(
    source: &Path,
    target: &Path,
    policy: DuplicateHandling,
    pattern: &str,
) -> io::Result<Resolution> {
    if !target.exists() {
        return Ok(Resolution {
            destination: Some(target.to_path_buf()),
            identical: false,
        });
    }

    let identical = fingerprint(source)? == fingerprint(target)?;
    let destination = match policy {
        DuplicateHandling::Overwrite => Some(target.to_path_buf()),
        DuplicateHandling::Skip => None,
        DuplicateHandling::Rename => next_free_name(target, pattern),
    };

    Ok(Resolution {
        destination,
        identical,
    })
}

/// Probes the rename pattern for the first path that does not exist yet.
fn next_free_name(target: &Path, pattern: &str) -> Option<PathBuf> {
    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    let (stem, ext) = split_name(target);

    for counter in 1..=MAX_RENAME_ATTEMPTS {
        let name = pattern
            .replace("{name}", &stem)
            .replace("{counter}", &format!("_{}", counter))
            .replace("{ext}", &ext);
        let candidate = parent.join(name);
        if !candidate.exists() {
            return Some(candidate);
        }
    }

    warn!(
        "no free name for {} after {} attempts, skipping",
        target.display(),
        MAX_RENAME_ATTEMPTS
    );
    None
}

/// Splits a file name into stem and dot-prefixed extension.
///
/// The dot of a leading-dot file name belongs to the stem, so `.config`
/// splits into (".config", "") while "report.pdf" splits into
/// ("report", ".pdf").
fn split_name(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(idx) if idx > 0 => (name[..idx].to_string(), name[idx..].to_string()),
        _ => (name, String::new()),
    }
}
