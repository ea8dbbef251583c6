//! CLI tests for Setconf
//!
//! This test suite covers:
//! - Argument parsing and invalid arguments
//! - Rendering record files to set lines
//! - Parsing device output into records
//! - Drift detection and exit codes
//! - Offline transactions against a snapshot file
//! - JSON output for scripting

mod common;

use assert_cmd::Command;
use common::Workspace;
use predicates::prelude::*;
use std::path::PathBuf;

const POOL_YAML: &str = "\
name: POOL1
active_drain: true
link: ae0
";

const POOL_OUTPUT: &str = "\
<configuration-output>
set active-drain
set link ae0
</configuration-output>
";

// Helper to get a command isolated from any local configuration
fn setconf_cmd(ws: &Workspace) -> Command {
    let config: PathBuf = ws.file("setconf.toml", "");
    let mut cmd = Command::cargo_bin("setconf").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("SETCONF_STRICT")
        .env_remove("SETCONF_ID_SEPARATOR")
        .arg("--no-color")
        .arg("--config")
        .arg(config);
    cmd
}

// ============================================================================
// Argument parsing
// ============================================================================

#[test]
fn test_help() {
    let ws = Workspace::new();
    setconf_cmd(&ws)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("drift"));
}

#[test]
fn test_version() {
    let ws = Workspace::new();
    setconf_cmd(&ws)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("setconf"));
}

#[test]
fn test_unknown_kind() {
    let ws = Workspace::new();
    let record = ws.file("pool.yml", POOL_YAML);
    setconf_cmd(&ws)
        .args(["render", "--kind", "bgp-group"])
        .arg(record)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// ============================================================================
// Render
// ============================================================================

#[test]
fn test_render_pool() {
    let ws = Workspace::new();
    let record = ws.file("pool.yml", POOL_YAML);
    setconf_cmd(&ws)
        .args(["render", "--kind", "address-pool"])
        .arg(record)
        .assert()
        .success()
        .stdout(
            "set access address-assignment pool POOL1 active-drain\n\
             set access address-assignment pool POOL1 link ae0\n",
        );
}

#[test]
fn test_render_replace_from_json() {
    let ws = Workspace::new();
    let record = ws.file(
        "ri.json",
        r#"{"name": "VR1", "instance_type": "virtual-router"}"#,
    );
    setconf_cmd(&ws)
        .args(["render", "--kind", "routing-instance", "--replace"])
        .arg(record)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "delete routing-instances VR1 instance-type\n",
        ))
        .stdout(predicate::str::contains("delete routing-instances VR1\n").not())
        .stdout(predicate::str::contains(
            "set routing-instances VR1 instance-type virtual-router",
        ));
}

#[test]
fn test_render_invalid_record() {
    let ws = Workspace::new();
    let record = ws.file("ri.yml", "name: VR1\nvrf_table_label: true\n");
    setconf_cmd(&ws)
        .args(["render", "--kind", "routing-instance"])
        .arg(record)
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("instance-type"));
}

#[test]
fn test_render_from_stdin() {
    let ws = Workspace::new();
    setconf_cmd(&ws)
        .args(["render", "--kind", "address-pool", "-"])
        .write_stdin(POOL_YAML)
        .assert()
        .success()
        .stdout(predicate::str::contains("pool POOL1 link ae0"));
}

// ============================================================================
// Parse
// ============================================================================

#[test]
fn test_parse_relative_output() {
    let ws = Workspace::new();
    let output = ws.file("out.txt", POOL_OUTPUT);
    setconf_cmd(&ws)
        .args(["parse", "--kind", "address-pool", "--id", "POOL1_-_default"])
        .arg(output)
        .assert()
        .success()
        .stdout(predicate::str::contains("name: POOL1"))
        .stdout(predicate::str::contains("active_drain: true"))
        .stdout(predicate::str::contains("link: ae0"));
}

#[test]
fn test_parse_empty_sentinel() {
    let ws = Workspace::new();
    let output = ws.file("out.txt", "empty\n");
    setconf_cmd(&ws)
        .args(["parse", "--kind", "routing-instance"])
        .arg(output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no routing-instance configuration found"));
}

#[test]
fn test_parse_zero_length_output() {
    let ws = Workspace::new();
    let output = ws.file("out.txt", "");
    setconf_cmd(&ws)
        .args(["parse", "--kind", "routing-instance"])
        .arg(output)
        .assert()
        .code(6);
}

#[test]
fn test_parse_json_output() {
    let ws = Workspace::new();
    let output = ws.file("out.txt", POOL_OUTPUT);
    let assert = setconf_cmd(&ws)
        .args(["--output", "json", "parse", "--kind", "address-pool"])
        .arg(output)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["link"], "ae0");
    assert_eq!(value["active_drain"], true);
}

// ============================================================================
// Drift
// ============================================================================

#[test]
fn test_drift_in_sync() {
    let ws = Workspace::new();
    let desired = ws.file("pool.yml", POOL_YAML);
    let actual = ws.file("out.txt", POOL_OUTPUT);
    setconf_cmd(&ws)
        .args(["drift", "--kind", "address-pool"])
        .arg(desired)
        .arg(actual)
        .assert()
        .code(0);
}

#[test]
fn test_drift_detected_with_fix() {
    let ws = Workspace::new();
    let desired = ws.file("pool.yml", POOL_YAML);
    let actual = ws.file("out.txt", "set active-drain\nset link ae9\n");
    setconf_cmd(&ws)
        .args(["drift", "--kind", "address-pool", "--fix"])
        .arg(desired)
        .arg(actual)
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "+set access address-assignment pool POOL1 link ae0",
        ))
        .stdout(predicate::str::contains(
            "delete access address-assignment pool POOL1 link ae9",
        ));
}

#[test]
fn test_drift_json() {
    let ws = Workspace::new();
    let desired = ws.file("pool.yml", POOL_YAML);
    let actual = ws.file("out.txt", "empty");
    let assert = setconf_cmd(&ws)
        .args(["--output", "json", "drift", "--kind", "address-pool"])
        .arg(desired)
        .arg(actual)
        .assert()
        .code(1);
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["in_sync"], false);
    assert_eq!(value["missing"].as_array().unwrap().len(), 2);
    assert_eq!(value["unexpected"].as_array().unwrap().len(), 0);
}

// ============================================================================
// Apply
// ============================================================================

#[test]
fn test_apply_create_writes_snapshot() {
    let ws = Workspace::new();
    let record = ws.file("pool.yml", POOL_YAML);
    let snapshot = ws.file("device.conf", "set system host-name lab1\n");
    setconf_cmd(&ws)
        .args(["apply", "--kind", "address-pool", "--write", "--device"])
        .arg(&snapshot)
        .arg(record)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "set access address-assignment pool POOL1 link ae0",
        ));

    let written = std::fs::read_to_string(&snapshot).unwrap();
    assert!(written.contains("set system host-name lab1"));
    assert!(written.contains("set access address-assignment pool POOL1 active-drain"));
}

#[test]
fn test_apply_create_existing_fails() {
    let ws = Workspace::new();
    let record = ws.file("pool.yml", POOL_YAML);
    let snapshot = ws.file(
        "device.conf",
        "set access address-assignment pool POOL1 link ae1\n",
    );
    setconf_cmd(&ws)
        .args(["apply", "--kind", "address-pool", "--device"])
        .arg(&snapshot)
        .arg(record)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    let untouched = std::fs::read_to_string(&snapshot).unwrap();
    assert_eq!(untouched, "set access address-assignment pool POOL1 link ae1\n");
}

#[test]
fn test_apply_delete() {
    let ws = Workspace::new();
    let record = ws.file("ri.yml", "name: OLD\n");
    let snapshot = ws.file(
        "device.conf",
        "set routing-instances OLD instance-type vrf\nset system host-name lab1\n",
    );
    setconf_cmd(&ws)
        .args(["apply", "--kind", "routing-instance", "--action", "delete", "--write", "--device"])
        .arg(&snapshot)
        .arg(record)
        .assert()
        .success();

    let written = std::fs::read_to_string(&snapshot).unwrap();
    assert_eq!(written, "set system host-name lab1\n");
}
