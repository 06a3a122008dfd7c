//! Integration tests for sortd
//!
//! These tests simulate real-world usage scenarios, testing the complete
//! end-to-end organization flow on temporary directories.
//!
//! Test categories:
//! 1. Classification modes (extension, date, size)
//! 2. Duplicate policies (rename, overwrite, skip)
//! 3. Traversal filtering and size gates
//! 4. Concurrency and failure isolation
//! 5. Configuration loading

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Datelike, Local};
use tempfile::TempDir;

use sortd::config::{Config, DuplicateHandling, OrganizeBy};
use sortd::organizer::FileOrganizer;
use sortd::stats::RunResult;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture with separate source and target trees under one tempdir.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create a new fixture with empty `source/` and `target/` directories.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("source")).expect("Failed to create source dir");
        fs::create_dir(temp_dir.path().join("target")).expect("Failed to create target dir");
        TestFixture { temp_dir }
    }

    fn source(&self) -> PathBuf {
        self.temp_dir.path().join("source")
    }

    fn target(&self) -> PathBuf {
        self.temp_dir.path().join("target")
    }

    /// A config wired to this fixture's trees, with the size gates disabled
    /// so small test files are not filtered away.
    fn config(&self) -> Config {
        let mut config = Config::default();
        config.source_directory = self.source().display().to_string();
        config.target_directory = self.target().display().to_string();
        config.min_file_size_kb = 0;
        config.max_file_size_mb = 0;
        config
    }

    /// Create a file under `source/`, creating intermediate directories.
    fn create_source_file(&self, rel_path: &str, content: &[u8]) -> PathBuf {
        let path = self.source().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = File::create(&path).expect("Failed to create file");
        file.write_all(content).expect("Failed to write file");
        path
    }

    /// Create a file under `target/`, creating intermediate directories.
    fn create_target_file(&self, rel_path: &str, content: &[u8]) -> PathBuf {
        let path = self.target().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = File::create(&path).expect("Failed to create file");
        file.write_all(content).expect("Failed to write file");
        path
    }

    fn assert_in_target(&self, rel_path: &str) {
        let path = self.target().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist in target: {}",
            path.display()
        );
    }

    fn assert_still_in_source(&self, rel_path: &str) {
        let path = self.source().join(rel_path);
        assert!(
            path.exists(),
            "File should still be in source: {}",
            path.display()
        );
    }

    fn target_content(&self, rel_path: &str) -> Vec<u8> {
        fs::read(self.target().join(rel_path)).expect("Failed to read target file")
    }
}

fn run(config: &Config) -> RunResult {
    FileOrganizer::new(config.clone())
        .organize()
        .expect("Organization run failed")
}

/// Expected year/month destination for a file, derived from its own mtime.
fn year_month_dir(target: &Path, file: &Path) -> PathBuf {
    let modified = fs::metadata(file)
        .and_then(|m| m.modified())
        .expect("Failed to stat file");
    let when: DateTime<Local> = modified.into();
    target
        .join(when.year().to_string())
        .join(format!("{:02}", when.month()))
}

// ============================================================================
// Classification modes
// ============================================================================

#[test]
fn test_extension_mode_routes_files_to_categories() {
    let fixture = TestFixture::new();
    fixture.create_source_file("report.pdf", b"pdf data");
    fixture.create_source_file("photo.jpg", b"jpg data");
    fixture.create_source_file("song.mp3", b"mp3 data");
    fixture.create_source_file("mystery.xyz", b"unknown data");

    let result = run(&fixture.config());

    assert_eq!(result.files_processed, 4);
    assert_eq!(result.files_moved, 4);
    assert_eq!(result.files_skipped, 0);
    assert_eq!(result.errors, 0);

    fixture.assert_in_target("documents/report.pdf");
    fixture.assert_in_target("images/photo.jpg");
    fixture.assert_in_target("audio/song.mp3");
    fixture.assert_in_target("others/mystery.xyz");
}

#[test]
fn test_extension_matching_ignores_case() {
    let fixture = TestFixture::new();
    fixture.create_source_file("PHOTO.JPG", b"jpg data");

    let result = run(&fixture.config());

    assert_eq!(result.files_moved, 1);
    fixture.assert_in_target("images/PHOTO.JPG");
}

#[test]
fn test_date_mode_groups_by_year_and_month() {
    let fixture = TestFixture::new();
    let first = fixture.create_source_file("first.txt", b"one");
    fixture.create_source_file("second.txt", b"two");

    let expected_dir = year_month_dir(&fixture.target(), &first);

    let mut config = fixture.config();
    config.organize_by = OrganizeBy::Date;
    let result = run(&config);

    assert_eq!(result.files_moved, 2);
    // Both were written moments apart, so they share a year/month folder.
    assert!(expected_dir.join("first.txt").exists());
    assert!(expected_dir.join("second.txt").exists());
}

#[test]
fn test_date_mode_with_day_folders() {
    let fixture = TestFixture::new();
    let file = fixture.create_source_file("notes.txt", b"notes");

    let modified = fs::metadata(&file)
        .and_then(|m| m.modified())
        .expect("Failed to stat file");
    let when: DateTime<Local> = modified.into();
    let expected = fixture
        .target()
        .join(when.year().to_string())
        .join(format!("{:02}", when.month()))
        .join(format!("{:02}", when.day()))
        .join("notes.txt");

    let mut config = fixture.config();
    config.organize_by = OrganizeBy::Date;
    config.create_date_folders = true;
    run(&config);

    assert!(expected.exists(), "expected {}", expected.display());
}

#[test]
fn test_size_mode_buckets_files() {
    let fixture = TestFixture::new();
    fixture.create_source_file("tiny.bin", &vec![0u8; 512]);
    fixture.create_source_file("exactly_one_mib.bin", &vec![0u8; 1024 * 1024]);

    let mut config = fixture.config();
    config.organize_by = OrganizeBy::Size;
    let result = run(&config);

    assert_eq!(result.files_moved, 2);
    fixture.assert_in_target("small/tiny.bin");
    // The 1 MiB boundary belongs to the bucket above.
    fixture.assert_in_target("medium/exactly_one_mib.bin");
}

// ============================================================================
// Duplicate policies
// ============================================================================

#[test]
fn test_rerun_moves_nothing_new() {
    let fixture = TestFixture::new();
    fixture.create_source_file("report.pdf", b"pdf data");

    let config = fixture.config();
    let first = run(&config);
    assert_eq!(first.files_moved, 1);

    let second = run(&config);
    assert_eq!(second.files_processed, 0);
    assert_eq!(second.files_moved, 0);
    assert_eq!(second.files_skipped, 0);
    assert_eq!(second.errors, 0);
}

#[test]
fn test_skip_policy_leaves_both_files_untouched() {
    let fixture = TestFixture::new();
    fixture.create_source_file("report.pdf", b"same bytes");

    let mut config = fixture.config();
    config.duplicate_handling = DuplicateHandling::Skip;
    run(&config);

    // The same file shows up in the source again.
    fixture.create_source_file("report.pdf", b"same bytes");
    let result = run(&config);

    assert_eq!(result.files_skipped, 1);
    assert_eq!(result.files_moved, 0);
    assert_eq!(result.errors, 0);
    assert_eq!(result.duplicates_found, 1);
    assert_eq!(fixture.target_content("documents/report.pdf"), b"same bytes");
    fixture.assert_still_in_source("report.pdf");
}

#[test]
fn test_skip_policy_also_skips_different_content() {
    let fixture = TestFixture::new();
    fixture.create_target_file("documents/report.pdf", b"existing");
    fixture.create_source_file("report.pdf", b"different");

    let mut config = fixture.config();
    config.duplicate_handling = DuplicateHandling::Skip;
    let result = run(&config);

    assert_eq!(result.files_skipped, 1);
    assert_eq!(result.duplicates_found, 0);
    assert_eq!(fixture.target_content("documents/report.pdf"), b"existing");
}

#[test]
fn test_rename_policy_probes_sequential_counters() {
    let fixture = TestFixture::new();
    fixture.create_target_file("documents/doc.pdf", b"original");

    fixture.create_source_file("doc.pdf", b"first collision");
    let result = run(&fixture.config());
    assert_eq!(result.files_moved, 1);
    assert_eq!(
        fixture.target_content("documents/doc_1.pdf"),
        b"first collision"
    );

    fixture.create_source_file("doc.pdf", b"second collision");
    let result = run(&fixture.config());
    assert_eq!(result.files_moved, 1);
    assert_eq!(
        fixture.target_content("documents/doc_2.pdf"),
        b"second collision"
    );

    // The original never changed.
    assert_eq!(fixture.target_content("documents/doc.pdf"), b"original");
}

#[test]
fn test_rename_policy_renames_identical_content_too() {
    let fixture = TestFixture::new();
    fixture.create_target_file("documents/doc.pdf", b"same bytes");
    fixture.create_source_file("doc.pdf", b"same bytes");

    let result = run(&fixture.config());

    assert_eq!(result.files_moved, 1);
    assert_eq!(result.duplicates_found, 1);
    assert_eq!(fixture.target_content("documents/doc_1.pdf"), b"same bytes");
}

#[test]
fn test_overwrite_policy_replaces_existing_file() {
    let fixture = TestFixture::new();
    fixture.create_target_file("documents/doc.pdf", b"old");
    fixture.create_source_file("doc.pdf", b"new");

    let mut config = fixture.config();
    config.duplicate_handling = DuplicateHandling::Overwrite;
    let result = run(&config);

    assert_eq!(result.files_moved, 1);
    assert_eq!(result.duplicates_found, 0);
    assert_eq!(fixture.target_content("documents/doc.pdf"), b"new");
}

// ============================================================================
// Traversal filtering and size gates
// ============================================================================

#[test]
fn test_excluded_directories_are_never_visited() {
    let fixture = TestFixture::new();
    fixture.create_source_file("node_modules/lib.js", b"js data");
    fixture.create_source_file("nested/keep.txt", b"text data");

    let result = run(&fixture.config());

    assert_eq!(result.files_moved, 1);
    fixture.assert_in_target("documents/keep.txt");
    fixture.assert_still_in_source("node_modules/lib.js");
}

#[test]
fn test_excluded_file_names_are_not_counted() {
    let fixture = TestFixture::new();
    fixture.create_source_file(".DS_Store", b"junk");

    let result = run(&fixture.config());

    assert_eq!(result.files_processed, 0);
    assert_eq!(result.files_moved, 0);
    assert_eq!(result.files_skipped, 0);
    fixture.assert_still_in_source(".DS_Store");
}

#[test]
fn test_exclude_patterns_match_file_names() {
    let fixture = TestFixture::new();
    fixture.create_source_file("download.part", b"partial");
    fixture.create_source_file("download.pdf", b"complete");

    let mut config = fixture.config();
    config.exclude_patterns = vec!["*.part".to_string()];
    let result = run(&config);

    assert_eq!(result.files_moved, 1);
    fixture.assert_still_in_source("download.part");
    fixture.assert_in_target("documents/download.pdf");
}

#[test]
fn test_max_size_gate_skips_large_files() {
    let fixture = TestFixture::new();
    fixture.create_source_file("big.bin", &vec![0u8; 2 * 1024 * 1024]);

    let mut config = fixture.config();
    config.max_file_size_mb = 1;
    let result = run(&config);

    assert_eq!(result.files_processed, 0);
    assert_eq!(result.files_moved, 0);
    assert_eq!(result.files_skipped, 1);
    fixture.assert_still_in_source("big.bin");
}

#[test]
fn test_min_size_gate_skips_small_files() {
    let fixture = TestFixture::new();
    fixture.create_source_file("stub.txt", b"x");

    let mut config = fixture.config();
    config.min_file_size_kb = 1;
    let result = run(&config);

    assert_eq!(result.files_moved, 0);
    assert_eq!(result.files_skipped, 1);
    fixture.assert_still_in_source("stub.txt");
}

// ============================================================================
// Concurrency and failure isolation
// ============================================================================

#[test]
fn test_thread_count_does_not_change_results() {
    let run_with_threads = |threads: usize| -> RunResult {
        let fixture = TestFixture::new();
        for i in 0..20 {
            fixture.create_source_file(&format!("file_{}.pdf", i), format!("pdf {}", i).as_bytes());
            fixture.create_source_file(&format!("file_{}.jpg", i), format!("jpg {}", i).as_bytes());
        }
        let mut config = fixture.config();
        config.performance.max_threads = threads;
        config.performance.batch_size = 7;
        run(&config)
    };

    let parallel = run_with_threads(4);
    let sequential = run_with_threads(1);

    assert_eq!(parallel.files_processed, 40);
    assert_eq!(parallel.files_processed, sequential.files_processed);
    assert_eq!(parallel.files_moved, sequential.files_moved);
    assert_eq!(parallel.files_skipped, sequential.files_skipped);
    assert_eq!(parallel.errors, sequential.errors);
}

#[test]
fn test_per_file_failure_does_not_abort_the_run() {
    let fixture = TestFixture::new();
    // A plain file where the category directory must go makes directory
    // creation fail for documents, while other categories keep working.
    fixture.create_target_file("documents", b"in the way");
    fixture.create_source_file("report.pdf", b"pdf data");
    fixture.create_source_file("photo.jpg", b"jpg data");

    let result = run(&fixture.config());

    assert_eq!(result.errors, 1);
    assert_eq!(result.files_moved, 1);
    fixture.assert_in_target("images/photo.jpg");
    fixture.assert_still_in_source("report.pdf");
}

#[test]
fn test_observer_reports_every_move() {
    let fixture = TestFixture::new();
    fixture.create_source_file("report.pdf", b"pdf data");
    fixture.create_source_file("photo.jpg", b"jpg data");

    let moves: Mutex<Vec<(PathBuf, PathBuf, String)>> = Mutex::new(Vec::new());
    let organizer = FileOrganizer::new(fixture.config());
    let result = organizer
        .organize_with_observer(&|source, destination, category| {
            moves.lock().unwrap().push((
                source.to_path_buf(),
                destination.to_path_buf(),
                category.to_string(),
            ));
        })
        .expect("Organization run failed");

    let moves = moves.into_inner().unwrap();
    assert_eq!(result.files_moved, 2);
    assert_eq!(moves.len(), 2);

    let categories: Vec<&str> = moves.iter().map(|(_, _, c)| c.as_str()).collect();
    assert!(categories.contains(&"documents"));
    assert!(categories.contains(&"images"));
    for (source, destination, _) in &moves {
        assert!(!source.exists());
        assert!(destination.exists());
    }
}

// ============================================================================
// Configuration loading
// ============================================================================

#[test]
fn test_config_file_drives_organization() {
    let fixture = TestFixture::new();
    fixture.create_source_file("paper.pdf", b"pdf data");
    fixture.create_source_file("notes.txt", b"text data");

    let config_path = fixture.temp_dir.path().join("config.json");
    let config_json = format!(
        r#"{{
            "source_directory": "{}",
            "target_directory": "{}",
            "rules": {{ "papers": [".pdf"] }},
            "min_file_size_kb": 0,
            "future_option": true
        }}"#,
        fixture.source().display(),
        fixture.target().display()
    );
    fs::write(&config_path, config_json).expect("Failed to write config");

    let config = Config::load(Some(&config_path)).expect("Failed to load config");
    let result = run(&config);

    assert_eq!(result.files_moved, 2);
    fixture.assert_in_target("papers/paper.pdf");
    // Extensions outside the single custom rule fall back to others.
    fixture.assert_in_target("others/notes.txt");
}
