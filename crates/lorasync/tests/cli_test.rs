//! Integration tests for the `lorasync` CLI binary.
//!
//! Argument parsing, help output, completions, config handling and
//! error exit codes, all without a live network server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command with env isolation: no `LORASYNC_*` variables and a
/// home directory that does not exist.
fn lorasync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("lorasync");
    cmd.env("HOME", "/tmp/lorasync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/lorasync-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/lorasync-cli-test-nonexistent")
        .env_remove("LORASYNC_CONFIG")
        .env_remove("LORASYNC_STATE")
        .env_remove("LORASYNC_OUTPUT")
        .env_remove("LORASYNC_INSECURE")
        .env_remove("RUST_LOG");
    cmd
}

const CONFIG: &str = r#"
[ingest]
public_url = "https://lora.example.com"

[networks.cs2]
protocol = "chirpstack-v2"
base_url = "http://127.0.0.1:9"
organization_id = "1"
username = "admin"
password = "hunter2"

[networks.lab]
protocol = "generic-ip"
"#;

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, CONFIG).unwrap();
    path
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = lorasync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    lorasync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("pull")
            .and(predicate::str::contains("push"))
            .and(predicate::str::contains("downlink")),
    );
}

#[test]
fn test_version_flag() {
    lorasync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lorasync"));
}

#[test]
fn test_completions_bash() {
    lorasync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    lorasync_cmd()
        .args(["--config", "/tmp/custom-lorasync.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/custom-lorasync.toml"));
}

#[test]
fn test_config_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    lorasync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[networks.cs2]")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_networks_list_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    lorasync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["-o", "json", "networks", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"chirpstack-v2\"")
                .and(predicate::str::contains("\"generic-ip\"")),
        );
}

// ── Errors and exit codes ───────────────────────────────────────────

#[test]
fn test_unknown_network_exits_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let output = lorasync_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--state")
        .arg(dir.path().join("state.json"))
        .args(["pull", "nope", "--company", "acme"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("cs2, lab"));
}

#[test]
fn test_downlink_port_out_of_range_is_usage_error() {
    let output = lorasync_cmd()
        .args(["downlink", "lab", "0004a30b001c0530", "--port", "0", "--data", "01"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_start_without_mapping_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let state = dir.path().join("state.json");
    std::fs::write(
        &state,
        r#"{
  "next_id": 2,
  "companies": [{ "id": 1, "name": "acme" }],
  "applications": [{
    "id": 2,
    "company_id": 1,
    "reporting_protocol": "http-post",
    "application": { "name": "Acme", "description": null, "payload_codec": null,
      "payload_decoder": null, "payload_encoder": null, "base_url": null,
      "organization_id": null }
  }]
}"#,
    )
    .unwrap();

    let output = lorasync_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--state")
        .arg(&state)
        .args(["apps", "start", "lab", "2"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("app:2/appNwkId"));
}

#[test]
fn test_mappings_on_empty_state_is_empty_json() {
    let dir = tempfile::tempdir().unwrap();
    lorasync_cmd()
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("--state")
        .arg(dir.path().join("state.json"))
        .args(["-o", "json-compact", "mappings"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

// ── Downlink ────────────────────────────────────────────────────────

/// One device on the Generic-IP network `lab`, already pushed there.
const PUSHED_IP_STATE: &str = r#"{
  "next_id": 5,
  "companies": [{ "id": 1, "name": "acme" }],
  "applications": [{
    "id": 2, "company_id": 1, "reporting_protocol": "http-post",
    "application": { "name": "Acme" }
  }],
  "device_profiles": [{
    "id": 3, "company_id": 1, "profile": { "name": "ip", "supports_join": false }
  }],
  "devices": [{
    "id": 4, "application_id": 2,
    "device": { "dev_eui": "0004a30b001c0530", "name": "meter", "skip_f_cnt_check": false }
  }],
  "device_links": [{
    "id": 5, "device_id": 4, "network_id": "lab", "device_profile_id": 3,
    "settings": { "dev_eui": "0004a30b001c0530", "name": "meter", "skip_f_cnt_check": false }
  }],
  "protocol_data": [
    { "network_id": "lab", "data_key": "app:2/appNwkId", "value": "2" },
    { "network_id": "lab", "data_key": "dev:4/devNwkId", "value": "0004a30b001c0530" }
  ]
}"#;

#[test]
fn test_downlink_to_pushed_ip_device_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let state = dir.path().join("state.json");
    std::fs::write(&state, PUSHED_IP_STATE).unwrap();

    lorasync_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--state")
        .arg(&state)
        .args(["downlink", "lab", "0004a30b001c0530", "--port", "1", "--data", "01ff"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0004a30b001c0530"));
}

#[test]
fn test_downlink_to_unknown_device_exits_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let state = dir.path().join("state.json");
    std::fs::write(&state, PUSHED_IP_STATE).unwrap();

    let output = lorasync_cmd()
        .arg("--config")
        .arg(&config)
        .arg("--state")
        .arg(&state)
        .args(["downlink", "lab", "0004a30b001c0599", "--port", "1", "--data", "01"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}
