//! Integration tests for the command-line binary
//!
//! Only commands that never reach the network are run here.

use std::process::Command;

use tempfile::TempDir;

use dataco_cache::cache::{CacheManager, Tier};
use dataco_cache::config::CacheConfig;
use dataco_cache::data::{CellValue, Snapshot};

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dataco-cache"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute dataco-cache")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dataco-cache"), "Help should mention the binary");
    assert!(stdout.contains("latest"), "Help should mention the latest command");
    assert!(stdout.contains("--root"), "Help should mention --root");
}

#[test]
fn test_invalid_tier_prints_error_and_exits() {
    let output = run_cli(&["latest", "cooked"]);
    assert!(!output.status.success(), "Expected invalid tier to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid tier"),
        "Should print error message about invalid tier: {}",
        stderr
    );
}

#[test]
fn test_latest_on_empty_tier_fails_with_not_found() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root = temp_dir.path().to_str().unwrap();

    let output = run_cli(&["--root", root, "latest", "interim"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No parquet files"), "Unexpected stderr: {}", stderr);
    assert!(temp_dir.path().join("data").join("processed").is_dir());
}

#[test]
fn test_list_and_latest_show_saved_snapshot() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let cache = CacheManager::new(CacheConfig::with_root(temp_dir.path()));
    let snapshot = Snapshot::new(
        vec!["Product Name".to_string(), "Product Price".to_string()],
        vec![vec!["Smart watch".into(), CellValue::Float(327.75)]],
    );
    let path = cache.save_snapshot(Tier::Processed, &snapshot, "products").unwrap();
    let root = temp_dir.path().to_str().unwrap();

    let listed = run_cli(&["--root", root, "list", "processed"]);
    assert!(listed.status.success());
    let stdout = String::from_utf8_lossy(&listed.stdout);
    assert!(stdout.contains(path.file_name().unwrap().to_str().unwrap()));

    let latest = run_cli(&["--root", root, "latest", "processed", "--head", "1"]);
    assert!(latest.status.success());
    let stdout = String::from_utf8_lossy(&latest.stdout);
    assert!(stdout.contains("1 rows x 2 columns"));
    assert!(stdout.contains("Smart watch"));
}

#[test]
fn test_status_reports_missing_raw_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root = temp_dir.path().to_str().unwrap();

    let output = run_cli(&["--root", root, "--max-age-hours", "6", "status"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DataCoSupplyChainDataset.csv"));
    assert!(stdout.contains("missing"));
    assert!(stdout.contains("max age 6h 00m"));
}
