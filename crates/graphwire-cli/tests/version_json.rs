//! Integration tests for `graphwire version`.

use serial_test::serial;
use std::process::Command;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "graphwire-cli", "--bin", "graphwire", "--"]);
    cmd
}

#[test]
#[serial]
fn test_version_plain() {
    let output = cargo_bin()
        .arg("version")
        .output()
        .expect("Failed to run version command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.trim();
    assert!(line.starts_with("graphwire "), "Unexpected version line: {stdout}");
    assert!(line.contains("(protocol 1"), "Missing protocol: {stdout}");
}

#[test]
#[serial]
fn test_version_json() {
    let output = cargo_bin()
        .args(["--json", "version"])
        .output()
        .expect("Failed to run version command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert!(json["version"].is_string(), "Missing version");
    assert_eq!(json["protocol"].as_u64(), Some(1));
}

#[test]
#[serial]
fn test_no_subcommand_prints_version() {
    let output = cargo_bin().output().expect("Failed to run graphwire");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("graphwire "));
}
