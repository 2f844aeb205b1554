//! CLI Integration Tests
//!
//! End-to-end tests for CLI commands using assert_cmd.

mod common;

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use common::*;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the conformance binary with a clean environment
fn conformance_cmd() -> Command {
    let mut cmd = Command::cargo_bin("conformance").unwrap();
    cmd.env_remove("OPENAI_API_BASE")
        .env_remove("OPENAI_API_KEY")
        .env_remove("CONFORMANCE_MODEL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_output() {
    conformance_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("conformance"));
}

#[test]
fn test_help_shows_all_commands() {
    conformance_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_run_help() {
    conformance_cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--base-url"))
        .stdout(predicate::str::contains("--scenario"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_list_shows_catalogue() {
    conformance_cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("stream-text"))
        .stdout(predicate::str::contains("invalid-model-rejected"));
}

#[test]
fn test_config_init_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("conformance.toml");

    conformance_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .success();

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[bridge]"));
}

#[test]
fn test_config_init_no_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("conformance.toml");
    std::fs::write(&config_path, "existing content").unwrap();

    conformance_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert_eq!(content, "existing content");
}

#[test]
fn test_completions_bash() {
    conformance_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("conformance"));
}

#[test]
fn test_run_rejects_unknown_scenario() {
    conformance_cmd()
        .args(["run", "--scenario", "teleport"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("teleport"));
}

#[test]
fn test_run_missing_config_file() {
    conformance_cmd()
        .args(["run", "-c", "/nonexistent/conformance.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_against_conformant_bridge_json() {
    let server = MockServer::start().await;
    mount_conformant_bridge(&server).await;
    let base_url = format!("{}/v1", server.uri());

    let output = tokio::task::spawn_blocking(move || {
        conformance_cmd()
            .args([
                "run",
                "--base-url",
                base_url.as_str(),
                "--model",
                TEST_MODEL,
                "--scenario",
                "chat-simple",
                "--scenario",
                "stream-text",
                "--json",
            ])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["passed"], 2);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["scenarios"][1]["name"], "stream-text");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_exits_nonzero_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_body(&[])))
        .mount(&server)
        .await;
    let base_url = format!("{}/v1", server.uri());

    let output = tokio::task::spawn_blocking(move || {
        conformance_cmd()
            .args(["run", "--base-url", base_url.as_str(), "--scenario", "list-models"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    output
        .assert()
        .failure()
        .stdout(predicate::str::contains("list-models"))
        .stdout(predicate::str::contains("FAIL"));
}
