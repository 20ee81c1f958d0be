//! CLI integration tests for the netbaseline binary.
//!
//! Each test runs the compiled binary inside a temporary directory that holds
//! its own rules, captures and manifest.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BEFORE: &str = "\
admin@core1> show bgp summary
Peer                     AS      InPkt     OutPkt    OutQ   Flaps Last State
10.0.0.2              65001       1200       1300       0       0    1d Establ
admin@core1> show configuration | display set
set system host-name core1
admin@core1>
";

const AFTER_BROKEN: &str = "\
admin@core1> show bgp summary
Peer                     AS      InPkt     OutPkt    OutQ   Flaps Last State
10.0.0.2              65001       1250       1350       0       1    0d Active
admin@core1> show configuration | display set
set system host-name core1
admin@core1>
";

const MANIFEST: &str = "\
devices:
  - hostname: core1
    platform: juniper_junos
    before: core1_pre.log
    after: core1_post.log
";

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Lays out a rules directory and a one-device manifest
fn lab(after: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "rules/juniper_junos/test_bgp.yml",
        "- command: show bgp summary\n  blacklist: [Peer]\n  tests:\n    - no-diff: [0, 7]\n",
    );
    write(dir.path(), "core1_pre.log", BEFORE);
    write(dir.path(), "core1_post.log", after);
    write(dir.path(), "devices.yml", MANIFEST);
    dir
}

/// The binary, isolated from the caller's configuration and environment
fn netbaseline(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("netbaseline").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("NETBASELINE_CONFIG")
        .env_remove("NETBASELINE_FORKS")
        .env_remove("NETBASELINE_RULES_PATH")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// General
// ============================================================================

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    netbaseline(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    netbaseline(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_clean_device_exits_zero() {
    let dir = lab(BEFORE);
    netbaseline(dir.path())
        .args(["--no-color", "check", "-m", "devices.yml"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Running core1:"))
        .stdout(predicate::str::contains("PASSED: 2  FAILED: 0  CONFIG: 0"));
}

#[test]
fn test_check_failures_exit_two() {
    let dir = lab(AFTER_BROKEN);
    netbaseline(dir.path())
        .args(["--no-color", "check", "-m", "devices.yml"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "FAILED! 10.0.0.2 65001 1200 1300 0 0 1d Establ => 10.0.0.2 65001 1250 1350 0 1 0d Active",
        ));
}

#[test]
fn test_check_json_document() {
    let dir = lab(AFTER_BROKEN);
    let output = netbaseline(dir.path())
        .args(["check", "-m", "devices.yml", "-j"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let failures = doc["core1"]["show bgp summary"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(doc["core1"]["show configuration"], serde_json::json!([]));
}

#[test]
fn test_check_config_only_ignores_rules() {
    let dir = lab(AFTER_BROKEN);
    netbaseline(dir.path())
        .args(["--no-color", "check", "-m", "devices.yml", "-c"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("show bgp summary").not());
}

#[test]
fn test_check_rules_from_config_file() {
    let dir = lab(AFTER_BROKEN);
    fs::rename(dir.path().join("rules"), dir.path().join("site-rules")).unwrap();
    write(
        dir.path(),
        "netbaseline.toml",
        "[defaults]\nrules_path = \"site-rules\"\nmanifest = \"devices.yml\"\n",
    );
    netbaseline(dir.path())
        .args(["--no-color", "check"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("FAILED!"));
}

#[test]
fn test_check_missing_manifest() {
    let dir = TempDir::new().unwrap();
    netbaseline(dir.path())
        .args(["check", "-m", "nope.yml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load manifest"));
}

#[test]
fn test_check_without_manifest() {
    let dir = TempDir::new().unwrap();
    netbaseline(dir.path())
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No manifest given"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_good_rules() {
    let dir = lab(BEFORE);
    netbaseline(dir.path())
        .args(["--no-color", "validate", "rules"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("1 valid, 0 skipped, 0 failed"));
}

#[test]
fn test_validate_broken_rule() {
    let dir = lab(BEFORE);
    write(dir.path(), "rules/juniper_junos/test_broken.yml", "- command: [unclosed\n");
    netbaseline(dir.path())
        .args(["--no-color", "validate", "rules", "--platform", "juniper_junos"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("test_broken.yml"));
}

#[test]
fn test_validate_missing_dir() {
    let dir = TempDir::new().unwrap();
    netbaseline(dir.path())
        .args(["validate", "absent"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Rules directory not found"));
}
