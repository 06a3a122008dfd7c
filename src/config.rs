//! Configuration loading and the per-run settings snapshot.
//!
//! Configuration is stored as a JSON object. Every key is optional; missing
//! keys fall back to the documented defaults and unrecognized keys are
//! ignored, so older or richer config files keep loading.
//!
//! # Configuration File Format
//!
//! ```json
//! {
//!     "source_directory": "~/Downloads",
//!     "target_directory": "~/Organized",
//!     "rules": {
//!         "documents": [".pdf", ".docx", ".txt"],
//!         "images": [".jpg", ".png"]
//!     },
//!     "exclude_files": [".DS_Store", "Thumbs.db"],
//!     "exclude_dirs": [".git", "node_modules"],
//!     "exclude_patterns": ["*.part"],
//!     "organize_by": "extension",
//!     "create_date_folders": false,
//!     "duplicate_handling": "rename",
//!     "max_file_size_mb": 500,
//!     "min_file_size_kb": 1,
//!     "performance": { "max_threads": 4, "batch_size": 100 },
//!     "advanced": { "rename_pattern": "{name}{counter}{ext}" }
//! }
//! ```

use glob::Pattern;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    NotFound(PathBuf),
    /// Invalid JSON syntax or structure.
    Invalid(String),
    /// Invalid glob pattern in `exclude_patterns`.
    InvalidPattern(String),
    /// IO error while reading the configuration file.
    Io(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidPattern(pattern) => {
                write!(f, "Invalid exclude pattern '{}'", pattern)
            }
            ConfigError::Io(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// How destination directories are derived from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrganizeBy {
    /// Category subdirectories looked up from the extension rules.
    Extension,
    /// Year/month (optionally day) subdirectories from the modification time.
    Date,
    /// Size-bucket subdirectories (small/medium/large/very_large).
    Size,
}

/// What to do when the destination path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateHandling {
    /// Probe the rename pattern for a free name.
    Rename,
    /// Replace the existing destination file.
    Overwrite,
    /// Leave the source file where it is.
    Skip,
}

/// Concurrency tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Performance {
    /// Worker threads per batch.
    pub max_threads: usize,
    /// Files handed to the worker pool at a time.
    pub batch_size: usize,
}

impl Default for Performance {
    fn default() -> Self {
        Self {
            max_threads: 4,
            batch_size: 100,
        }
    }
}

/// Rarely-changed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Advanced {
    /// Template for duplicate renaming, with `{name}`, `{counter}` and
    /// `{ext}` placeholders.
    pub rename_pattern: String,
}

impl Default for Advanced {
    fn default() -> Self {
        Self {
            rename_pattern: "{name}{counter}{ext}".to_string(),
        }
    }
}

/// Immutable-after-load snapshot consulted by every component of a run.
///
/// Category rules keep their file order: when two categories claim the same
/// extension, the first one listed wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory whose files get organized. Tilde paths are expanded.
    pub source_directory: String,
    /// Root directory that category subdirectories are created under.
    pub target_directory: String,
    /// Category name to extension list, consulted in file order.
    pub rules: IndexMap<String, Vec<String>>,
    /// Exact file names dropped during traversal.
    pub exclude_files: Vec<String>,
    /// Directory names pruned during traversal, never descended into.
    pub exclude_dirs: Vec<String>,
    /// Glob patterns matched against file names during traversal.
    pub exclude_patterns: Vec<String>,
    /// Active organization mode.
    pub organize_by: OrganizeBy,
    /// In date mode, add a day level below year/month.
    pub create_date_folders: bool,
    /// Policy for destination paths that already exist.
    pub duplicate_handling: DuplicateHandling,
    /// Files larger than this are skipped. 0 disables the check.
    pub max_file_size_mb: u64,
    /// Files smaller than this are skipped. 0 disables the check.
    pub min_file_size_kb: u64,
    /// Concurrency tuning.
    pub performance: Performance,
    /// Rarely-changed settings.
    pub advanced: Advanced,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_directory: "~/Downloads".to_string(),
            target_directory: "~/Organized".to_string(),
            rules: default_rules(),
            exclude_files: vec![".DS_Store".to_string(), "Thumbs.db".to_string()],
            exclude_dirs: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "__pycache__".to_string(),
            ],
            exclude_patterns: Vec::new(),
            organize_by: OrganizeBy::Extension,
            create_date_folders: false,
            duplicate_handling: DuplicateHandling::Rename,
            max_file_size_mb: 500,
            min_file_size_kb: 1,
            performance: Performance::default(),
            advanced: Advanced::default(),
        }
    }
}

fn default_rules() -> IndexMap<String, Vec<String>> {
    let mut rules = IndexMap::new();
    let table: [(&str, &[&str]); 6] = [
        (
            "documents",
            &[".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt"],
        ),
        (
            "images",
            &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp"],
        ),
        ("videos", &[".mp4", ".mov", ".avi", ".mkv", ".wmv", ".flv"]),
        ("audio", &[".mp3", ".wav", ".ogg", ".flac", ".aac", ".m4a"]),
        ("archives", &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"]),
        (
            "code",
            &[
                ".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".php", ".rb", ".go",
            ],
        ),
    ];
    for (category, extensions) in table {
        rules.insert(
            category.to_string(),
            extensions.iter().map(|e| e.to_string()).collect(),
        );
    }
    rules
}

impl Config {
    /// Load configuration, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.sortd.json` in the current directory
    /// 3. Look for `~/.config/sortd/config.json` in the home directory
    /// 4. Fall back to the default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the file that was found cannot be read or parsed,
    /// or if an explicitly provided path does not exist.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::resolve_path(config_path) {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Like [`Config::load`], but a broken file logs an error and falls back
    /// to the full default configuration instead of failing the caller.
    /// A partially parsed file is never used.
    pub fn load_or_default(config_path: Option<&Path>) -> Self {
        match Self::load(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("falling back to default configuration: {e}");
                Self::default()
            }
        }
    }

    /// Determines which configuration file a load would read.
    ///
    /// An explicit path is always returned, even if the file is missing, so
    /// that loading it reports the failure instead of silently using
    /// defaults. The well-known locations are only returned when present.
    pub fn resolve_path(config_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = config_path {
            return Some(path.to_path_buf());
        }

        let local_config = PathBuf::from(".sortd.json");
        if local_config.exists() {
            return Some(local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortd")
                .join("config.json");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.compiled_excludes()?;
        Ok(config)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// The source directory with tilde expansion applied.
    pub fn source_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.source_directory).into_owned())
    }

    /// The target directory with tilde expansion applied.
    pub fn target_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.target_directory).into_owned())
    }

    /// Compiles `exclude_patterns` into matchers, validating every pattern.
    pub fn compiled_excludes(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidPattern(pattern.clone()))
            })
            .collect()
    }
}

/// A configuration tied to the file it was loaded from.
///
/// Long-lived processes call [`ConfigHandle::reload_if_modified`] before each
/// run so edits to the file take effect without a restart. The file is only
/// re-read when its modification time changes.
#[derive(Debug)]
pub struct ConfigHandle {
    path: PathBuf,
    modified: Option<SystemTime>,
    config: Config,
}

impl ConfigHandle {
    /// Loads the configuration from `path` and remembers its mtime.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::load_from_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: file_mtime(path),
            config,
        })
    }

    /// The currently loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Re-reads the file if it changed since the last load.
    ///
    /// Returns `Ok(true)` when a new configuration was loaded. On a read or
    /// parse failure the previously loaded configuration stays in effect and
    /// the error is returned to the caller.
    pub fn reload_if_modified(&mut self) -> Result<bool, ConfigError> {
        let current = file_mtime(&self.path);
        if current == self.modified {
            return Ok(false);
        }

        let config = Config::load_from_file(&self.path)?;
        self.config = config;
        self.modified = current;
        Ok(true)
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
