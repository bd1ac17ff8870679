//! Integration tests for the `smarthqd` binary.
//!
//! Every case exits during startup, before any network I/O.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

const SMARTHQ_VARS: &[&str] = &[
    "SMARTHQ_CONFIG",
    "SMARTHQ_ACCESS_TOKEN",
    "SMARTHQ_USERNAME",
    "SMARTHQ_PASSWORD",
    "SMARTHQ_REGION",
    "SMARTHQ_WEBSOCKET_URL",
    "SMARTHQ_API_HOST",
    "SMARTHQ_HOST",
    "SMARTHQ_PORT",
    "SMARTHQ_LOG_LEVEL",
    "SMARTHQ_RECONNECT_INTERVAL",
    "SMARTHQ_RECONNECT_MAX_INTERVAL",
    "SMARTHQ_HEARTBEAT_INTERVAL",
    "SMARTHQ_EVENT_LOG_CAPACITY",
];

/// `smarthqd` with every `SMARTHQ_*` variable cleared.
fn smarthqd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("smarthqd");
    for var in SMARTHQ_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn help_lists_flags() {
    smarthqd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--port"));
}

#[test]
fn version_flag() {
    smarthqd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("smarthqd"));
}

// ── Startup failures ────────────────────────────────────────────────

#[test]
fn no_credentials_is_a_config_error() {
    smarthqd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no credentials configured"));
}

#[test]
fn missing_config_file_is_reported() {
    smarthqd()
        .args(["--config", "/nonexistent/smarthq.toml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn invalid_websocket_url_is_rejected() {
    smarthqd()
        .env("SMARTHQ_ACCESS_TOKEN", "tok")
        .env("SMARTHQ_WEBSOCKET_URL", "https://ws.example.com")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("websocket_url"));
}

#[test]
fn invalid_host_override_is_rejected() {
    smarthqd()
        .env("SMARTHQ_ACCESS_TOKEN", "tok")
        .args(["--host", "not-an-ip"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not an IP address"));
}

#[test]
fn password_login_fails_authentication() {
    let file = config_file(
        r#"
username = "cook@example.com"
password = "hunter2"
port = 0
"#,
    );
    smarthqd()
        .arg("--config")
        .arg(file.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not supported"))
        .stderr(predicate::str::contains("hunter2").not());
}
