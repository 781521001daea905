//! Integration tests for `tether config`.
//!
//! Every test points `TETHER_CONFIG` at a temp path so nothing touches the
//! real user configuration.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tether() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tether"));
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Returns a `TempDir` and the path string for a config file inside it.
fn temp_config_path() -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir
        .path()
        .join("config.yaml")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}

// ---------------------------------------------------------------------------
// `tether config show`
// ---------------------------------------------------------------------------

#[test]
fn test_config_help_shows_show_and_set_subcommands() {
    tether()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"));
}

#[test]
fn test_config_show_without_file_uses_defaults() {
    let (_dir, path) = temp_config_path();
    tether()
        .args(["config", "show"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("runtime:"))
        .stdout(predicate::str::contains("bun"))
        .stdout(predicate::str::contains("300"))
        .stdout(predicate::str::contains("(not set)"))
        .stdout(predicate::str::contains("TETHER_CONFIG"));
}

#[test]
fn test_config_show_does_not_create_file() {
    let (_dir, path) = temp_config_path();
    tether()
        .args(["config", "show"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success();
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_show_json_is_structured() {
    let (_dir, path) = temp_config_path();
    let assert = tether()
        .args(["config", "show", "--json"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success();
    let value: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid JSON");
    assert_eq!(value["runtime"], "bun");
    assert_eq!(value["alerts"]["cooldown_secs"], 300);
}

// ---------------------------------------------------------------------------
// `tether config set`
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_persists_values() {
    let (_dir, path) = temp_config_path();
    tether()
        .args(["config", "set", "runtime", "/opt/bun/bin/bun"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("runtime"));
    tether()
        .args(["config", "set", "alerts.cooldown_secs", "60"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).expect("config written");
    assert!(content.contains("/opt/bun/bin/bun"), "got: {content}");
    assert!(content.contains("60"), "got: {content}");

    tether()
        .args(["config", "show"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("/opt/bun/bin/bun"));
}

#[cfg(unix)]
#[test]
fn test_config_set_writes_owner_only_file() {
    use std::os::unix::fs::PermissionsExt;
    let (_dir, path) = temp_config_path();
    tether()
        .args(["config", "set", "runtime", "node"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_config_set_unknown_key_fails() {
    let (_dir, path) = temp_config_path();
    tether()
        .args(["config", "set", "security.level", "strict"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown setting: security.level"))
        .stderr(predicate::str::contains("alerts.webhook"));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_set_invalid_value_fails() {
    let (_dir, path) = temp_config_path();
    tether()
        .args(["config", "set", "alerts.cooldown_secs", "soon"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid value for alerts.cooldown_secs"));
    tether()
        .args(["config", "set", "alerts.webhook", "ftp://example.com"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .code(1);
}

#[test]
fn test_config_set_invalid_json_error_code() {
    let (_dir, path) = temp_config_path();
    let assert = tether()
        .args(["--json", "config", "set", "nope", "x"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .code(1);
    let value: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid JSON");
    assert_eq!(value["code"], "invalid_config");
}

#[test]
fn test_config_set_empty_webhook_clears_it() {
    let (_dir, path) = temp_config_path();
    tether()
        .args(["config", "set", "alerts.webhook", "https://hooks.example.com/x"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success();
    tether()
        .args(["config", "show"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .stdout(predicate::str::contains("https://hooks.example.com/x"));

    tether()
        .args(["config", "set", "alerts.webhook", ""])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success();
    tether()
        .args(["config", "show"])
        .env("TETHER_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("https://hooks.example.com/x").not());
}
