//! Integration tests for `graphwire describe`.

use serial_test::serial;
use std::io::Write;
use std::process::Command;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "graphwire-cli", "--bin", "graphwire", "--"]);
    cmd
}

fn describe(args: &[&str]) -> serde_json::Value {
    let output = cargo_bin()
        .args(args)
        .arg("describe")
        .output()
        .expect("Failed to run describe command");

    assert!(
        output.status.success(),
        "describe failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

#[test]
#[serial]
fn test_describe_default_depth() {
    let json = describe(&[]);

    assert_eq!(json["name"], "Plant");
    assert_eq!(json["help"], "Demo heating plant.");
    let methods: Vec<&str> = json["methods"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(methods, ["Start", "Stop", "Ramp"]);

    // Depth 1 includes the zones with their inherited sensor members.
    let zone = &json["nodeGroups"][0]["nodes"]["1"];
    assert_eq!(zone["proxyTypes"], serde_json::json!(["Zone", "Sensor"]));
    assert!(zone["properties"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p["name"] == "Reading"));
    assert!(json["nodeGroups"][0]["nodes"].get("2").is_none());
}

#[test]
#[serial]
fn test_describe_depth_flag() {
    let json = describe(&["--depth", "0"]);
    assert!(json["nodes"][0].get("class").is_none());
    assert!(json["nodeGroups"][0].get("nodes").is_none());
}

#[test]
#[serial]
fn test_describe_depth_from_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"metadataDepth": 0}}"#).unwrap();

    let path = file.path().to_str().unwrap();
    let json = describe(&["--config", path]);
    assert!(json["nodes"][0].get("class").is_none());

    // The flag wins over the file.
    let json = describe(&["--config", path, "--depth", "1"]);
    assert_eq!(json["nodes"][0]["class"]["name"], "Burner");
}

#[test]
#[serial]
fn test_describe_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = cargo_bin()
        .args(["--config"])
        .arg(dir.path().join("absent.json"))
        .arg("describe")
        .output()
        .expect("Failed to run describe command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to read config"),
        "Should report the config file: {stderr}"
    );
}
