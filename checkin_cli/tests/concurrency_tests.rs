//! Concurrency tests for the checkin binary.
//!
//! These tests verify that multiple processes can safely:
//! - Append to the same log file simultaneously (file locking)
//! - Read logs while another process is writing

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::thread;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("checkin"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_concurrent_weight_logging() {
    let temp_dir = setup_test_dir();
    let data_dir: PathBuf = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (1..=8)
        .map(|day| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli(&data_dir)
                    .args([
                        "log-weight",
                        "--kg",
                        &format!("{}.5", 70 + day),
                        "--date",
                        &format!("2024-05-{:02}", day),
                    ])
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    let content = std::fs::read_to_string(data_dir.join("users/default/weight.jsonl"))
        .expect("Failed to read weight log");

    // Every line must be a whole record
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("interleaved write"))
        .collect();
    assert_eq!(records.len(), 8, "Expected 8 records, got {}", records.len());
}

#[test]
fn test_concurrent_reads_and_writes() {
    let temp_dir = setup_test_dir();
    let data_dir: PathBuf = temp_dir.path().to_path_buf();

    cli(&data_dir)
        .args(["log-macros", "--calories", "2000", "--protein", "150"])
        .args(["--carbs", "200", "--fat", "60", "--date", "2024-05-01"])
        .assert()
        .success();

    let writer = {
        let data_dir = data_dir.clone();
        thread::spawn(move || {
            for day in 2..=6 {
                cli(&data_dir)
                    .args(["log-macros", "--calories", "2100", "--protein", "150"])
                    .args(["--carbs", "210", "--fat", "65"])
                    .args(["--date", &format!("2024-05-{:02}", day)])
                    .assert()
                    .success();
            }
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                cli(&data_dir)
                    .args(["consumed", "--date", "2024-05-01"])
                    .assert()
                    .success();
            })
        })
        .collect();

    writer.join().expect("writer panicked");
    for reader in readers {
        reader.join().expect("reader panicked");
    }

    let content =
        std::fs::read_to_string(data_dir.join("users/default/manual_macros.jsonl")).unwrap();
    assert_eq!(content.lines().count(), 6);
}
