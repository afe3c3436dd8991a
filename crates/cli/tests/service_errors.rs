use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

// Nothing listens on the discard port in test environments.
const DEAD_SERVICE: &str = "http://127.0.0.1:9";

#[allow(deprecated)]
fn segview(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("segview").expect("binary");
    cmd.current_dir(workdir)
        .env_remove("SEGVIEW_API_URL")
        .env_remove("SEGVIEW_TIMEOUT_SECS");
    cmd
}

fn json_stdout(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn show_reports_fetch_failure_as_json_envelope() {
    let temp = tempdir().unwrap();
    let output = segview(temp.path())
        .args(["show", "--json", "--timeout-secs", "2", "--api-url", DEAD_SERVICE])
        .output()
        .expect("command run");

    assert!(!output.status.success());
    let body = json_stdout(&output);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "fetch_failed");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to fetch records"));
    assert!(body["error"]["hint"].as_str().unwrap().contains(DEAD_SERVICE));
}

#[test]
fn upload_rejects_non_csv_before_contacting_service() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("customers.xlsx"), "not really a spreadsheet").unwrap();

    let output = segview(root)
        .args(["upload", "customers.xlsx", "--json", "--api-url", DEAD_SERVICE])
        .output()
        .expect("command run");

    assert!(!output.status.success());
    let body = json_stdout(&output);
    assert_eq!(body["error"]["code"], "invalid_upload");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Please upload a valid CSV file."));
}

#[test]
fn upload_reports_missing_file() {
    let temp = tempdir().unwrap();
    segview(temp.path())
        .args(["upload", "absent.csv", "--api-url", DEAD_SERVICE])
        .assert()
        .failure()
        .stderr(contains("Please select a file first."));
}

#[test]
fn upload_transport_failure_uses_generic_message() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("customers.csv"), "CustomerID,Age\n1,20\n").unwrap();

    let output = segview(root)
        .args([
            "upload",
            "customers.csv",
            "--json",
            "--timeout-secs",
            "2",
            "--api-url",
            DEAD_SERVICE,
        ])
        .output()
        .expect("command run");

    assert!(!output.status.success());
    let body = json_stdout(&output);
    assert_eq!(body["error"]["code"], "upload_failed");
    assert_eq!(body["error"]["message"], "Upload failed. Please try again.");
}

#[test]
fn missing_config_file_is_an_error() {
    let temp = tempdir().unwrap();
    segview(temp.path())
        .args(["--config", "nope.toml", "show"])
        .assert()
        .failure()
        .stderr(contains("Failed to read config"));
}

#[test]
fn config_file_with_unknown_keys_is_rejected() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("segview.toml"), "endpoint = \"http://svc\"\n").unwrap();

    segview(root)
        .args(["download"])
        .assert()
        .failure()
        .stderr(contains("Invalid config"));
}

#[test]
fn download_failure_leaves_no_file() {
    let temp = tempdir().unwrap();
    let root = temp.path();

    segview(root)
        .args(["download", "--timeout-secs", "2", "--api-url", DEAD_SERVICE])
        .assert()
        .failure()
        .stderr(contains("Failed to download results."));
    assert!(!root.join("segmented_customers.csv").exists());
}
