//! Integration tests for the tsdb-unit binary.
//!
//! These tests exercise the compiled binary using assert_cmd. No test
//! reaches a real package manager: hooks run against a host root that
//! lacks the database marker, so they stop before any command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// Get a Command for the tsdb-unit binary with a clean environment
fn unit_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tsdb-unit"));
    cmd.env_remove("TSDB_UNIT_STATE_DIR")
        .env_remove("TSDB_UNIT_RESOURCES_DIR")
        .env_remove("TSDB_UNIT_HOST_ROOT")
        .env_remove("TSDB_UNIT_NO_SUDO")
        .env("RUST_LOG", "warn")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_output() {
    unit_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("TimescaleDB"));
}

#[test]
fn test_version_output() {
    unit_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_event_is_usage_error() {
    unit_cmd().args(["hook", "stop"]).assert().code(2);
}

#[test]
fn test_check_options_valid() {
    unit_cmd()
        .args([
            "check-options",
            "--set",
            "apt-repository=https://packagecloud.io/timescale/timescaledb/ubuntu/",
            "--set",
            "version=2.11.2~ubuntu20.04",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-repository"))
        .stdout(predicate::str::contains("2.11.2~ubuntu20.04"));
}

#[test]
fn test_check_options_from_yaml_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("options.yaml");
    fs::write(&path, "from-resources: true\napt-key: \"\"\n").unwrap();

    unit_cmd()
        .args(["check-options", "--options"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("from-artifacts"));
}

#[test]
fn test_check_options_rejects_bad_pin() {
    unit_cmd()
        .args(["check-options", "--set", "version=--force-yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid value for option 'version'"));
}

#[test]
fn test_status_on_empty_state_dir() {
    let dir = tempdir().unwrap();

    unit_cmd()
        .arg("--state-dir")
        .arg(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("not installed"))
        .stdout(predicate::str::contains("none reported"));
}

#[test]
fn test_install_without_database_defers() {
    let state = tempdir().unwrap();
    let host_root = tempdir().unwrap();

    unit_cmd()
        .arg("--state-dir")
        .arg(state.path())
        .arg("--host-root")
        .arg(host_root.path())
        .args([
            "--no-sudo",
            "hook",
            "install",
            "--set",
            "apt-repository=https://packagecloud.io/timescale/timescaledb/ubuntu/",
        ])
        .assert()
        .code(75)
        .stdout(predicate::str::contains("waiting for postgresql to be installed"));

    // Deferred without committing state, but the status was persisted
    assert!(!state.path().join("state.toml").exists());
    assert!(state.path().join("status.json").exists());

    unit_cmd()
        .arg("--state-dir")
        .arg(state.path())
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"installed\": false"))
        .stdout(predicate::str::contains("\"state\": \"waiting\""));
}

#[test]
fn test_hook_json_output() {
    let state = tempdir().unwrap();
    let host_root = tempdir().unwrap();

    unit_cmd()
        .arg("--state-dir")
        .arg(state.path())
        .arg("--host-root")
        .arg(host_root.path())
        .args(["hook", "upgrade-charm", "--json"])
        .assert()
        .code(75)
        .stdout(predicate::str::contains("\"event\": \"upgrade-charm\""))
        .stdout(predicate::str::contains("\"disposition\": \"defer\""));
}

#[test]
fn test_unreadable_state_defers_with_blocked_status() {
    let state = tempdir().unwrap();
    let host_root = tempdir().unwrap();
    fs::write(state.path().join("state.toml"), "installed = [").unwrap();

    unit_cmd()
        .arg("--state-dir")
        .arg(state.path())
        .arg("--host-root")
        .arg(host_root.path())
        .args(["hook", "config-changed"])
        .assert()
        .code(75)
        .stdout(predicate::str::contains("state store failed"));
}
