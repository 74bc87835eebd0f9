//! Integration tests for `graphwire dispatch`.

use serial_test::serial;
use std::io::Write;
use std::process::{Command, Stdio};

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "graphwire-cli", "--bin", "graphwire", "--"]);
    cmd
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("each stdout line should be JSON"))
        .collect()
}

const SESSION: &str = r#"{"name":"Plant","events":[{"name":"StatusChanged","subscribeAction":1}]}
{"name":"Plant","methods":[{"name":"Start","execute":true}],"properties":[{"name":"Status"},{"name":"Bogus"}]}
{"name":"Plant","nodeGroups":[{"name":"Zones","nodes":{"2":{"properties":[{"name":"Reading"}]},"3":{"properties":[{"name":"Reading"}]}}}]}
"#;

#[test]
#[serial]
fn test_dispatch_file_with_feedback() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SESSION.as_bytes()).unwrap();

    let output = cargo_bin()
        .arg("dispatch")
        .arg(file.path())
        .output()
        .expect("Failed to run dispatch command");

    assert!(
        output.status.success(),
        "dispatch failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 4, "three responses and one feedback: {lines:?}");

    // Subscription acknowledged.
    assert_eq!(lines[0]["events"][0]["result"], serde_json::json!({}));

    // Start fired StatusChanged before its response was printed.
    let feedback = &lines[1]["events"][0];
    assert_eq!(feedback["name"], "StatusChanged");
    assert_eq!(feedback["result"]["type"], "Status");
    assert_eq!(feedback["result"]["value"], "Running");
    assert!(feedback.get("subscribeAction").is_none());

    let started = &lines[2];
    assert_eq!(started["methods"][0]["result"], serde_json::json!({}));
    assert_eq!(started["properties"][0]["result"]["value"], "Running");
    assert_eq!(started["properties"][1]["result"]["errorCode"], 1);

    let zones = &lines[3]["nodeGroups"][0];
    assert_eq!(zones["nodes"]["2"]["result"]["errorCode"], 2);
    assert_eq!(
        zones["nodes"]["3"]["properties"][0]["result"]["value"],
        serde_json::json!(17.0)
    );
}

#[test]
#[serial]
fn test_dispatch_stdin() {
    let mut child = cargo_bin()
        .args(["dispatch", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn dispatch command");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(br#"{"name":"Plant","properties":[{"name":"Target","value":"75"}]}"#)
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 1);
    let target = &lines[0]["properties"][0]["result"];
    assert_eq!(target["type"], "f64");
    assert_eq!(target["value"], serde_json::json!(75.0));
}

#[test]
#[serial]
fn test_dispatch_invalid_request_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{\"name\": ").unwrap();

    let output = cargo_bin()
        .arg("dispatch")
        .arg(file.path())
        .output()
        .expect("Failed to run dispatch command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid request"),
        "Should report the decode failure: {stderr}"
    );
}

#[test]
#[serial]
fn test_dispatch_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("requests.json");

    let output = cargo_bin()
        .arg("dispatch")
        .arg(&missing)
        .output()
        .expect("Failed to run dispatch command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to read"),
        "Should report the read failure: {stderr}"
    );
}
