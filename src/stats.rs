//! Run statistics: thread-safe counters and the per-run result.
//!
//! A [`Stats`] instance is shared by every worker in a run. Each field is a
//! separate atomic counter, so recording an outcome never takes a lock and a
//! snapshot can be read at any time while workers are still active.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Mutable run counters, incremented by workers as files are handled.
///
/// Every file entering processing bumps `files_processed`; exactly one of
/// `files_moved`, `files_skipped`, or `errors` is then recorded for it.
/// `duplicates_found` is tracked independently: it counts identical-content
/// collisions regardless of which policy decided the file's fate.
#[derive(Debug)]
pub struct Stats {
    files_processed: AtomicU64,
    files_moved: AtomicU64,
    files_skipped: AtomicU64,
    errors: AtomicU64,
    duplicates_found: AtomicU64,
    started: Instant,
}

impl Stats {
    /// Creates a fresh counter set with the clock started.
    pub fn new() -> Self {
        Self {
            files_processed: AtomicU64::new(0),
            files_moved: AtomicU64::new(0),
            files_skipped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            duplicates_found: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Records that a file entered processing.
    pub fn record_processed(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed move.
    pub fn record_moved(&self) {
        self.files_moved.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file left in place on purpose.
    pub fn record_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a per-file failure.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an identical-content collision with an existing destination.
    pub fn record_duplicate(&self) {
        self.duplicates_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time snapshot of all counters and the elapsed time.
    pub fn snapshot(&self) -> RunResult {
        RunResult {
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_moved: self.files_moved.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            duplicates_found: self.duplicates_found.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one `organize` run: outcome counts plus wall-clock duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Files that entered processing (passed the size gate).
    pub files_processed: u64,
    /// Files moved to a destination directory.
    pub files_moved: u64,
    /// Files intentionally left in place (exclusions, policy, size gate).
    pub files_skipped: u64,
    /// Files whose processing failed with an I/O error.
    pub errors: u64,
    /// Identical-content collisions detected at the destination.
    pub duplicates_found: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunResult {
    /// Returns true if any file failed during the run.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Folds another run's counts into this one.
    ///
    /// Useful for aggregating totals across repeated runs of a long-lived
    /// process; counts are summed and durations added.
    pub fn merge(&mut self, other: &RunResult) {
        self.files_processed += other.files_processed;
        self.files_moved += other.files_moved;
        self.files_skipped += other.files_skipped;
        self.errors += other.errors;
        self.duplicates_found += other.duplicates_found;
        self.elapsed += other.elapsed;
    }
}
