//! End-to-end tests for the `tdp fetch` command
//!
//! These tests validate the full fetch workflow including:
//! - Crash-safe staged download and promotion
//! - Idempotent re-runs (no network call for existing partitions)
//! - Expected absence (404) handling
//! - Soft-failure exit codes
//! - The structured JSON attempt record on stdout

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn fetch_cmd(server_uri: &str, raw_root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tdp").unwrap();
    cmd.env(
        "TDP_ARCHIVE_URL",
        format!("{}/trip-data/{{dataset}}_{{year}}-{{month}}.parquet", server_uri),
    )
    .arg("fetch")
    .arg("--dataset")
    .arg("demo")
    .arg("--raw-root")
    .arg(raw_root.path());
    cmd
}

fn canonical_path(raw_root: &TempDir, month: &str) -> PathBuf {
    raw_root.path().join(format!(
        "source=tlc/dataset=demo/year=2024/month={m}/demo_2024-{m}.parquet",
        m = month
    ))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_single_month_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/trip-data/demo_2024-01.parquet"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PAR1testbody".to_vec()))
        .mount(&mock_server)
        .await;

    let raw_root = TempDir::new().unwrap();
    fetch_cmd(&mock_server.uri(), &raw_root)
        .arg("--year")
        .arg("2024")
        .arg("--month")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"success\""))
        .stdout(predicate::str::contains("\"dataset\":\"demo\""));

    let final_path = canonical_path(&raw_root, "01");
    assert!(final_path.exists());
    let sidecar = final_path.parent().unwrap().join("demo_2024-01.parquet.meta.json");
    assert!(sidecar.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_is_idempotent_without_network() {
    let mock_server = MockServer::start().await;

    // The mock allows exactly one request; the second invocation must skip
    // before any network call
    Mock::given(method("GET"))
        .and(path("/trip-data/demo_2024-02.parquet"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PAR1".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let raw_root = TempDir::new().unwrap();
    fetch_cmd(&mock_server.uri(), &raw_root)
        .arg("--year")
        .arg("2024")
        .arg("--month")
        .arg("2")
        .assert()
        .success();

    fetch_cmd(&mock_server.uri(), &raw_root)
        .arg("--year")
        .arg("2024")
        .arg("--month")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"skipped\""))
        .stdout(predicate::str::contains("\"reason\":\"already_exists\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_404_is_expected_absence() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let raw_root = TempDir::new().unwrap();
    fetch_cmd(&mock_server.uri(), &raw_root)
        .arg("--year")
        .arg("2024")
        .arg("--month")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"skipped\""))
        .stdout(predicate::str::contains("\"reason\":\"expected_absence\""))
        .stdout(predicate::str::contains("\"http_status\":404"));

    assert!(!canonical_path(&raw_root, "01").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_server_error_exits_soft_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/trip-data/demo_2024-03.parquet"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/trip-data/demo_2024-04.parquet"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PAR1".to_vec()))
        .mount(&mock_server)
        .await;

    let raw_root = TempDir::new().unwrap();
    fetch_cmd(&mock_server.uri(), &raw_root)
        .arg("--from")
        .arg("2024-03")
        .arg("--to")
        .arg("2024-04")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"reason\":\"server_error\""))
        .stdout(predicate::str::contains("\"status\":\"success\""));

    // The failed month did not stop the range
    assert!(!canonical_path(&raw_root, "03").exists());
    assert!(canonical_path(&raw_root, "04").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_zero_bytes_counts_as_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::new()))
        .mount(&mock_server)
        .await;

    let raw_root = TempDir::new().unwrap();
    fetch_cmd(&mock_server.uri(), &raw_root)
        .arg("--year")
        .arg("2024")
        .arg("--month")
        .arg("5")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"reason\":\"zero_bytes\""));

    assert!(!canonical_path(&raw_root, "05").exists());
}

#[test]
fn test_fetch_rejects_month_without_year() {
    let raw_root = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("tdp").unwrap();
    cmd.arg("fetch")
        .arg("--dataset")
        .arg("demo")
        .arg("--month")
        .arg("3")
        .arg("--raw-root")
        .arg(raw_root.path());

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("--month requires --year"));
}
