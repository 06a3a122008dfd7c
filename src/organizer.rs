//! Batch execution: traversal, filtering, the worker pool, and the per-file
//! move pipeline.
//!
//! One [`FileOrganizer::organize`] call walks the source tree, partitions the
//! discovered files into batches, and processes each batch on a bounded
//! worker pool. Failures are contained to the file that caused them; the run
//! always finishes and reports everything in its [`RunResult`].

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use rayon::prelude::*;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::classifier::Classifier;
use crate::config::{Config, ConfigError};
use crate::duplicates;
use crate::stats::{RunResult, Stats};

/// Callback invoked after each successful move with the original path, the
/// final destination path, and the category label (the destination
/// directory relative to the target root, e.g. `documents` or `2025/08`).
pub type MoveObserver<'a> = dyn Fn(&Path, &Path, &str) + Sync + 'a;

/// Run-level failures that prevent an organization run from starting.
///
/// Per-file failures never surface here; they are recorded in the run's
/// error count instead.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source directory is missing or not a directory.
    InvalidSourceDir {
        path: PathBuf,
        source: io::Error,
    },
    /// The configuration cannot be used for a run (broken exclude pattern).
    Config(ConfigError),
    /// The worker pool could not be created.
    WorkerPool { reason: String },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSourceDir { path, source } => {
                write!(f, "Invalid source directory {}: {}", path.display(), source)
            }
            Self::Config(e) => write!(f, "{}", e),
            Self::WorkerPool { reason } => {
                write!(f, "Failed to create worker pool: {}", reason)
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Per-run state shared by all workers.
struct RunContext<'a> {
    classifier: Classifier,
    stats: Stats,
    on_file_moved: &'a MoveObserver<'a>,
}

/// Moves files from the source tree into categorized destinations.
///
/// The organizer owns an immutable configuration snapshot; every call to
/// [`organize`](FileOrganizer::organize) is an independent run with fresh
/// statistics.
///
/// # Examples
///
/// ```no_run
/// use sortd::config::Config;
/// use sortd::organizer::FileOrganizer;
///
/// let organizer = FileOrganizer::new(Config::default());
/// let result = organizer.organize()?;
/// println!("moved {} files", result.files_moved);
/// # Ok::<(), sortd::organizer::OrganizeError>(())
/// ```
pub struct FileOrganizer {
    config: Config,
}

impl FileOrganizer {
    /// Creates an organizer over a configuration snapshot.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration this organizer runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one organization pass over the source directory.
    pub fn organize(&self) -> Result<RunResult, OrganizeError> {
        self.organize_with_observer(&|_, _, _| {})
    }

    /// Runs one organization pass, invoking `on_file_moved` after every
    /// successful move.
    ///
    /// The observer is called from worker threads, possibly concurrently.
    ///
    /// # Errors
    ///
    /// Fails only for run-level setup problems: a missing source directory,
    /// a broken exclude pattern, or a worker pool that cannot be built. A
    /// run that encounters per-file failures still completes and reports
    /// them in the result's error count.
    pub fn organize_with_observer(
        &self,
        on_file_moved: &MoveObserver<'_>,
    ) -> Result<RunResult, OrganizeError> {
        let source = self.config.source_dir();
        let meta = fs::metadata(&source).map_err(|e| OrganizeError::InvalidSourceDir {
            path: source.clone(),
            source: e,
        })?;
        if !meta.is_dir() {
            return Err(OrganizeError::InvalidSourceDir {
                path: source,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let exclude_globs = self
            .config
            .compiled_excludes()
            .map_err(OrganizeError::Config)?;

        let ctx = RunContext {
            classifier: Classifier::new(&self.config),
            stats: Stats::new(),
            on_file_moved,
        };

        let files = self.discover_files(&source, &exclude_globs, &ctx.stats);
        info!(
            "found {} files to organize under {}",
            files.len(),
            source.display()
        );

        let max_threads = self.config.performance.max_threads.max(1);
        let batch_size = self.config.performance.batch_size.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .build()
            .map_err(|e| OrganizeError::WorkerPool {
                reason: e.to_string(),
            })?;

        // Batches run strictly one after another; only the files inside a
        // batch are processed concurrently.
        for batch in files.chunks(batch_size) {
            debug!("processing batch of {} files", batch.len());
            pool.install(|| {
                batch
                    .par_iter()
                    .for_each(|path| self.process_file(path, &ctx));
            });
        }

        let result = ctx.stats.snapshot();
        info!(
            "organization complete: {} processed, {} moved, {} skipped, {} duplicates, {} errors in {:.2}s",
            result.files_processed,
            result.files_moved,
            result.files_skipped,
            result.duplicates_found,
            result.errors,
            result.elapsed.as_secs_f64()
        );
        Ok(result)
    }

    /// Walks the source tree and collects the files to process.
    ///
    /// Excluded directories are pruned before descent; excluded file names
    /// and glob matches are dropped here, before any task is created.
    /// Traversal failures (unreadable directories) are recorded as run
    /// errors and the walk continues.
    fn discover_files(&self, source: &Path, exclude_globs: &[Pattern], stats: &Stats) -> Vec<PathBuf> {
        let exclude_dirs: HashSet<&str> =
            self.config.exclude_dirs.iter().map(String::as_str).collect();
        let exclude_files: HashSet<&str> =
            self.config.exclude_files.iter().map(String::as_str).collect();

        let walker = WalkDir::new(source).into_iter().filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            !exclude_dirs.contains(entry.file_name().to_string_lossy().as_ref())
        });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    error!("error walking source tree: {}", e);
                    stats.record_error();
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if exclude_files.contains(name.as_ref()) {
                debug!("excluded by name: {}", entry.path().display());
                continue;
            }
            if exclude_globs.iter().any(|p| p.matches(&name)) {
                debug!("excluded by pattern: {}", entry.path().display());
                continue;
            }
            files.push(entry.into_path());
        }
        files
    }

    /// Processes one file, folding any failure into the error count.
    fn process_file(&self, path: &Path, ctx: &RunContext<'_>) {
        if let Err(e) = self.try_process(path, ctx) {
            error!("error processing {}: {}", path.display(), e);
            ctx.stats.record_error();
        }
    }

    /// The per-file pipeline: size gate, classification, destination setup,
    /// duplicate resolution, move.
    fn try_process(&self, path: &Path, ctx: &RunContext<'_>) -> io::Result<()> {
        let size = fs::metadata(path)?.len();

        let min_kb = self.config.min_file_size_kb;
        if min_kb > 0 && size < min_kb * 1024 {
            debug!("skipping {}: below minimum size", path.display());
            ctx.stats.record_skipped();
            return Ok(());
        }
        let max_mb = self.config.max_file_size_mb;
        if max_mb > 0 && size > max_mb * 1024 * 1024 {
            debug!("skipping {}: above maximum size", path.display());
            ctx.stats.record_skipped();
            return Ok(());
        }

        ctx.stats.record_processed();

        let dest_dir = match ctx.classifier.destination_dir(path)? {
            Some(dir) => dir,
            None => {
                debug!("skipping {}: no destination", path.display());
                ctx.stats.record_skipped();
                return Ok(());
            }
        };

        // Idempotent; two workers racing to create the same category
        // directory is fine.
        fs::create_dir_all(&dest_dir)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "file has no name"))?;
        let target = dest_dir.join(file_name);

        let resolution = duplicates::resolve(
            path,
            &target,
            self.config.duplicate_handling,
            &self.config.advanced.rename_pattern,
        )?;
        if resolution.identical {
            ctx.stats.record_duplicate();
        }

        let final_path = match resolution.destination {
            Some(final_path) => final_path,
            None => {
                debug!("skipping duplicate {}", path.display());
                ctx.stats.record_skipped();
                return Ok(());
            }
        };

        move_file(path, &final_path)?;
        info!("moved {} -> {}", path.display(), final_path.display());
        ctx.stats.record_moved();

        let category = category_label(ctx.classifier.target(), &dest_dir);
        (ctx.on_file_moved)(path, &final_path, &category);
        Ok(())
    }
}

/// Runs one organization pass with the given configuration.
pub fn organize(config: Config) -> Result<RunResult, OrganizeError> {
    FileOrganizer::new(config).organize()
}

/// Moves a file, falling back to copy-and-delete when a plain rename is not
/// possible (destinations on another filesystem).
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !source.exists() {
                return Err(rename_err);
            }
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
    }
}

/// The destination directory relative to the target root, as a label for
/// observers and logs.
fn category_label(target: &Path, dest_dir: &Path) -> String {
    dest_dir
        .strip_prefix(target)
        .unwrap_or(dest_dir)
        .to_string_lossy()
        .into_owned()
}
