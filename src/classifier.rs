//! Destination resolution for files being organized.
//!
//! This module decides where a file belongs under the target directory:
//! a category subdirectory looked up from the extension rules, a
//! year/month(/day) folder derived from the modification time, or a size
//! bucket. It never touches the file beyond reading its metadata.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local};
use indexmap::IndexMap;

use crate::config::{Config, OrganizeBy};

/// Category assigned to extensions no rule claims.
pub const FALLBACK_CATEGORY: &str = "others";

const MIB: u64 = 1024 * 1024;

/// Maps file extensions to category labels.
///
/// Built once per run from the configured rules. Extensions are normalized
/// to lower case with a leading dot; when two categories claim the same
/// extension, the category listed first wins.
///
/// # Examples
///
/// ```
/// use sortd::classifier::RuleTable;
/// use sortd::config::Config;
///
/// let table = RuleTable::new(&Config::default().rules);
/// assert_eq!(table.category_for(".pdf"), "documents");
/// assert_eq!(table.category_for(".xyz"), "others");
/// ```
#[derive(Debug, Clone)]
pub struct RuleTable {
    by_extension: HashMap<String, String>,
}

impl RuleTable {
    /// Builds the lookup table from category rules in file order.
    pub fn new(rules: &IndexMap<String, Vec<String>>) -> Self {
        let mut by_extension = HashMap::new();
        for (category, extensions) in rules {
            for ext in extensions {
                by_extension
                    .entry(normalize_extension(ext))
                    .or_insert_with(|| category.clone());
            }
        }
        Self { by_extension }
    }

    /// Looks up the category for a dot-prefixed extension.
    ///
    /// Unmatched extensions (including the empty extension of files without
    /// one) map to [`FALLBACK_CATEGORY`].
    pub fn category_for(&self, ext: &str) -> &str {
        self.by_extension
            .get(ext)
            .map(String::as_str)
            .unwrap_or(FALLBACK_CATEGORY)
    }
}

/// Normalizes a rule extension: lower case, leading dot guaranteed.
fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Lower-cased, dot-prefixed extension of a path, or an empty string.
///
/// Dotfiles like `.gitignore` have no extension, matching how the rest of
/// the world splits file names.
fn file_extension(path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => String::new(),
    }
}

/// Size bucket label for size-mode organization.
///
/// Buckets are right-open MiB ranges, so a file of exactly 1 MiB lands in
/// `medium`, 10 MiB in `large`, and 100 MiB in `very_large`.
pub fn size_bucket(bytes: u64) -> &'static str {
    if bytes < MIB {
        "small"
    } else if bytes < 10 * MIB {
        "medium"
    } else if bytes < 100 * MIB {
        "large"
    } else {
        "very_large"
    }
}

/// Computes destination directories for files under the active mode.
#[derive(Debug, Clone)]
pub struct Classifier {
    target: PathBuf,
    mode: OrganizeBy,
    create_date_folders: bool,
    exclude_files: HashSet<String>,
    rules: RuleTable,
}

impl Classifier {
    /// Builds a classifier from the run configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            target: config.target_dir(),
            mode: config.organize_by,
            create_date_folders: config.create_date_folders,
            exclude_files: config.exclude_files.iter().cloned().collect(),
            rules: RuleTable::new(&config.rules),
        }
    }

    /// The target directory destinations are built under.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Resolves the destination directory for a file.
    ///
    /// Returns `Ok(None)` when the file should not be organized (its base
    /// name is excluded). Metadata reads can fail, so date and size modes
    /// surface I/O errors instead of guessing.
    pub fn destination_dir(&self, path: &Path) -> io::Result<Option<PathBuf>> {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => return Ok(None),
        };
        if self.exclude_files.contains(name.as_ref()) {
            return Ok(None);
        }

        match self.mode {
            OrganizeBy::Extension => {
                let category = self.rules.category_for(&file_extension(path));
                Ok(Some(self.target.join(category)))
            }
            OrganizeBy::Date => {
                let modified = fs::metadata(path)?.modified()?;
                let when: DateTime<Local> = modified.into();
                let mut dir = self
                    .target
                    .join(when.year().to_string())
                    .join(format!("{:02}", when.month()));
                if self.create_date_folders {
                    dir = dir.join(format!("{:02}", when.day()));
                }
                Ok(Some(dir))
            }
            OrganizeBy::Size => {
                let size = fs::metadata(path)?.len();
                Ok(Some(self.target.join(size_bucket(size))))
            }
        }
    }
}

/// Resolves the destination directory for a single file.
///
/// Convenience wrapper over [`Classifier`] for callers that classify one
/// file at a time.
pub fn destination_for(path: &Path, config: &Config) -> io::Result<Option<PathBuf>> {
    Classifier::new(config).destination_dir(path)
}
