//! End-to-end tests for the `tdp ingest` command
//!
//! These tests validate the full ingestion workflow including:
//! - Dry-run preview without ledger writes
//! - Real runs and idempotent re-runs
//! - Checksum collision aborts
//! - Sanity violation aborts

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn ingest_cmd(raw_root: &Path, db_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tdp").unwrap();
    cmd.arg("ingest")
        .arg("--raw-root")
        .arg(raw_root)
        .arg("--db-path")
        .arg(db_path);
    cmd
}

fn write_partition(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_dry_run_with_no_files() {
    let raw_root = TempDir::new().unwrap();
    let db_path = raw_root.path().join("ledger.db");

    ingest_cmd(raw_root.path(), &db_path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Files detected: 0"));

    assert!(!db_path.exists());
}

#[test]
fn test_dry_run_previews_without_writing() {
    let raw_root = TempDir::new().unwrap();
    let db_path = raw_root.path().join("ledger.db");
    write_partition(raw_root.path(), "a/demo_2024-01.parquet", b"data");

    ingest_cmd(raw_root.path(), &db_path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Files detected: 1"))
        .stdout(predicate::str::contains("WOULD INGEST: a/demo_2024-01.parquet"));

    assert!(!db_path.exists());
}

#[test]
fn test_ingest_then_reingest() {
    let raw_root = TempDir::new().unwrap();
    let db_path = raw_root.path().join("ledger.db");
    write_partition(raw_root.path(), "a/demo_2024-01.parquet", b"january");
    write_partition(raw_root.path(), "b/demo_2024-02.parquet", b"february");

    ingest_cmd(raw_root.path(), &db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 detected, 2 ingested, 0 skipped"));

    ingest_cmd(raw_root.path(), &db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("SKIPPED: a/demo_2024-01.parquet"))
        .stdout(predicate::str::contains("2 detected, 0 ingested, 2 skipped"));
}

#[test]
fn test_collision_aborts_with_exit_code_2() {
    let raw_root = TempDir::new().unwrap();
    let db_path = raw_root.path().join("ledger.db");
    let file = write_partition(raw_root.path(), "a/demo_2024-01.parquet", b"original");

    ingest_cmd(raw_root.path(), &db_path).assert().success();

    std::fs::write(&file, b"tampered").unwrap();
    ingest_cmd(raw_root.path(), &db_path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Checksum collision"));
}

#[test]
fn test_zero_byte_file_aborts_run() {
    let raw_root = TempDir::new().unwrap();
    let db_path = raw_root.path().join("ledger.db");
    write_partition(raw_root.path(), "a/demo_2024-01.parquet", b"");

    ingest_cmd(raw_root.path(), &db_path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("zero bytes"));
}
