//! Integration tests for the `openly` CLI binary.
//!
//! Argument parsing, help output, shell completions and error handling run
//! offline. The end-to-end cases point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `openly` binary with env isolation.
///
/// Clears all `OPENLY_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn openly_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("openly");
    cmd.env("HOME", "/tmp/openly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/openly-cli-test-nonexistent")
        .env_remove("OPENLY_PROFILE")
        .env_remove("OPENLY_EMAIL")
        .env_remove("OPENLY_PASSWORD")
        .env_remove("OPENLY_API_URL")
        .env_remove("OPENLY_LOGIN_URL")
        .env_remove("OPENLY_OUTPUT")
        .env_remove("OPENLY_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// `openly_cmd` wired to a mock cloud with flag-supplied credentials.
fn mock_cmd(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = openly_cmd();
    cmd.args(["--email", "me@example.com", "--password", "hunter2"])
        .args(["--api-url", &format!("{}/api", server.uri())])
        .args(["--login-url", &format!("{}/oauth/token", server.uri())])
        .args(["--color", "never"]);
    cmd
}

/// Run a command off the async runtime and collect its output.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Mount login, a single hub, and its devices.
async fn mock_cloud(lock_mode: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/hubs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hubs": [{ "id": "hub-1", "name": "Unit 4B" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/hubs/hub-1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "lock-1",
                "deviceType": "lock",
                "name": "Front Door",
                "status": { "battery": 77, "mode": lock_mode }
            },
            { "id": "thermo-1", "deviceType": "thermostat", "status": {} }
        ])))
        .mount(&server)
        .await;

    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = openly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    openly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("smart locks")
            .and(predicate::str::contains("hubs"))
            .and(predicate::str::contains("locks"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    openly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("openly"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    openly_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    openly_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("openly"));
}

// ── Argument errors ─────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = openly_cmd().arg("garage-door").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_output_format() {
    let output = openly_cmd()
        .args(["--output", "xml", "locks", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("xml"));
}

#[test]
fn test_lock_requires_device_id() {
    let output = openly_cmd().args(["locks", "lock"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_wait_timeout_requires_wait() {
    let output = openly_cmd()
        .args(["locks", "unlock", "lock-1", "--wait-timeout", "5"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_subcommand_help() {
    openly_cmd()
        .args(["locks", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("unlock")
                .and(predicate::str::contains("refresh"))
                .and(predicate::str::contains("list")),
        );
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_command_without_config_fails() {
    let output = openly_cmd().args(["hubs", "list"]).output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("config init") || text.contains("Configuration"),
        "Expected configuration hint in output:\n{text}"
    );
}

#[test]
fn test_unknown_profile_fails() {
    let output = openly_cmd()
        .args(["--profile", "nope", "locks", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("nope"));
}

#[test]
fn test_config_show_succeeds_without_file() {
    openly_cmd()
        .args(["config", "show", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile"));
}

// ── End-to-end against a mock cloud ─────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_hubs_list_plain() {
    let server = mock_cloud("locked").await;
    let mut cmd = mock_cmd(&server);
    cmd.args(["--output", "plain", "hubs", "list"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hub-1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_locks_list_json() {
    let server = mock_cloud("unlocked").await;
    let mut cmd = mock_cmd(&server);
    cmd.args(["--output", "json-compact", "locks", "list"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let locks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        locks,
        json!([{
            "id": "lock-1",
            "hub_id": "hub-1",
            "name": "Front Door",
            "status": "unlocked",
            "battery": 77
        }])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lock_command_reports_locking() {
    let server = mock_cloud("unlocked").await;
    Mock::given(method("PUT"))
        .and(path("/api/devices/lock-1"))
        .and(body_json(json!({ "commands": { "mode": "lock" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = mock_cmd(&server);
    cmd.args(["--output", "plain", "locks", "lock", "lock-1"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "locking");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_jammed_lock_rejects_command() {
    let server = mock_cloud("jammed").await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = mock_cmd(&server);
    cmd.args(["locks", "unlock", "lock-1"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(6), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_lock_is_not_found() {
    let server = mock_cloud("locked").await;
    let mut cmd = mock_cmd(&server);
    cmd.args(["locks", "get", "thermo-1"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut cmd = mock_cmd(&server);
    cmd.args(["hubs", "list"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Authentication failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_outage_exits_with_connection_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let mut cmd = mock_cmd(&server);
    cmd.args(["hubs", "list"]);

    let output = run(cmd).await;
    let text = combined_output(&output);
    assert_eq!(output.status.code(), Some(7), "{text}");
    assert!(!text.contains("Authentication failed"), "{text}");
}
