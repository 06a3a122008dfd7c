//! Command-line interface module for sortd.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing and config overrides
//! - Running a single organization pass
//! - The interval loop for periodic runs
//! - JSON and human-readable result output

use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, ConfigHandle, OrganizeBy};
use crate::organizer::FileOrganizer;
use crate::output::OutputFormatter;
use crate::stats::RunResult;

/// Organize files into categorized directories by extension, date, or size.
#[derive(Debug, Parser)]
#[command(name = "sortd", version, about)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Source directory to organize (overrides the configuration)
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Target directory for organized files (overrides the configuration)
    #[arg(long, value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Organization mode (overrides the configuration)
    #[arg(long, value_enum, value_name = "MODE")]
    pub organize_by: Option<OrganizeBy>,

    /// Print the run result as JSON instead of the summary table
    #[arg(long)]
    pub json: bool,

    /// Keep running, repeating the organization every N seconds and
    /// reloading the configuration file when it changes
    #[arg(long, value_name = "SECONDS")]
    pub every: Option<u64>,
}

impl Cli {
    /// Applies command-line overrides on top of a loaded configuration.
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(source) = &self.source {
            config.source_directory = source.display().to_string();
        }
        if let Some(target) = &self.target {
            config.target_directory = target.display().to_string();
        }
        if let Some(mode) = self.organize_by {
            config.organize_by = mode;
        }
        config
    }
}

/// Runs the CLI application.
///
/// Loads the configuration (explicit path, well-known locations, or
/// defaults), applies overrides, and either runs once or enters the
/// interval loop.
pub fn run(cli: Cli) -> Result<(), String> {
    let mut handle = match Config::resolve_path(cli.config.as_deref()) {
        Some(path) => Some(
            ConfigHandle::load(&path)
                .map_err(|e| format!("Error loading configuration: {}", e))?,
        ),
        None => None,
    };

    let config = cli.apply_overrides(match &handle {
        Some(handle) => handle.config().clone(),
        None => Config::default(),
    });

    let interval = match cli.every {
        Some(seconds) => seconds,
        None => return run_once(&config, cli.json),
    };

    let mut config = config;
    loop {
        if let Err(e) = run_once(&config, cli.json) {
            OutputFormatter::error(&e);
        }
        thread::sleep(Duration::from_secs(interval));

        if let Some(handle) = handle.as_mut() {
            match handle.reload_if_modified() {
                Ok(true) => {
                    info!("configuration file changed, reloaded");
                    config = cli.apply_overrides(handle.config().clone());
                }
                Ok(false) => {}
                Err(e) => {
                    OutputFormatter::warning(&format!(
                        "Configuration reload failed, keeping previous settings: {}",
                        e
                    ));
                }
            }
        }
    }
}

/// Runs a single organization pass and prints the result.
fn run_once(config: &Config, json_output: bool) -> Result<(), String> {
    let organizer = FileOrganizer::new(config.clone());

    let result = if json_output {
        organizer.organize().map_err(|e| e.to_string())?
    } else {
        OutputFormatter::info(&format!(
            "Organizing {} into {}",
            config.source_dir().display(),
            config.target_dir().display()
        ));

        let spinner = OutputFormatter::create_spinner();
        let result = organizer
            .organize_with_observer(&|_source, destination, _category| {
                spinner.inc(1);
                spinner.set_message(destination.display().to_string());
            })
            .map_err(|e| e.to_string());
        spinner.finish_and_clear();
        result?
    };

    if json_output {
        println!("{}", result_json(&result));
    } else {
        OutputFormatter::summary(&result);
        if result.has_errors() {
            OutputFormatter::warning("Some files could not be organized. See the log for details.");
        } else {
            OutputFormatter::success("Organization complete.");
        }
    }

    Ok(())
}

/// Serializes a run result with stable field names.
fn result_json(result: &RunResult) -> String {
    let value = json!({
        "files_processed": result.files_processed,
        "files_moved": result.files_moved,
        "files_skipped": result.files_skipped,
        "errors": result.errors,
        "duplicates_found": result.duplicates_found,
        "elapsed_seconds": result.elapsed.as_secs_f64(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}
