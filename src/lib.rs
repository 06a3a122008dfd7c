//! sortd - rule-based file organization
//!
//! This library moves files from a source directory into categorized
//! destinations based on configurable rules (extension, modification date,
//! or file size), with content-hash duplicate handling and parallel batch
//! execution. The command-line binary is a thin wrapper over
//! [`organizer::FileOrganizer`].

pub mod classifier;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod organizer;
pub mod output;
pub mod stats;

pub use classifier::{Classifier, RuleTable};
pub use config::{Config, ConfigError, ConfigHandle, DuplicateHandling, OrganizeBy};
pub use duplicates::Resolution;
pub use organizer::{FileOrganizer, OrganizeError};
pub use stats::{RunResult, Stats};
