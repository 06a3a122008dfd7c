//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored
//! output, progress tracking, and the run summary table. This module
//! abstracts away output details, making it easy to change formatting
//! globally.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::stats::RunResult;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a spinner that ticks once per moved file.
    ///
    /// The total file count is not known up front, so this is a spinner with
    /// a running counter rather than a bar.
    pub fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {pos} moved {msg}")
                .expect("Invalid progress spinner template"),
        );
        pb
    }

    /// Prints a summary table for a completed run.
    pub fn summary(result: &RunResult) {
        Self::header("SUMMARY");

        let rows = [
            ("Processed", result.files_processed.to_string().green()),
            ("Moved", result.files_moved.to_string().green()),
            ("Skipped", result.files_skipped.to_string().yellow()),
            ("Duplicates", result.duplicates_found.to_string().yellow()),
            (
                "Errors",
                if result.errors > 0 {
                    result.errors.to_string().red()
                } else {
                    result.errors.to_string().green()
                },
            ),
        ];

        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0);

        for (label, count) in &rows {
            println!("{:<width$} | {}", label, count, width = width);
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {:.2}s",
            "Elapsed".bold(),
            result.elapsed.as_secs_f64(),
            width = width
        );
    }
}
