//! Tests running the `exo-agent` binary.

#![cfg(unix)]

use std::fs;
use std::process::Command;

const AGENT_BIN: &str = env!("CARGO_BIN_EXE_exo-agent");
const MOCK_BIN: &str = env!("CARGO_BIN_EXE_exo-mock-input");

fn setup() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let inputs = dir.path().join("plugins").join("inputs");
    fs::create_dir_all(&inputs).unwrap();
    std::os::unix::fs::symlink(MOCK_BIN, inputs.join("mock")).unwrap();

    let config = format!(
        "[agent]\nplugin_dir = \"{}\"\nstart_timeout_ms = 5000\n\n\
         [[inputs.mock]]\nmetric_name = \"demo\"\nvalue = 42\n\
         tags = {{ host = \"a\" }}\nlog_message = \"hello from mock\"\n",
        dir.path().join("plugins").display()
    );
    fs::write(dir.path().join("agent.toml"), config).unwrap();
    dir
}

#[test]
fn test_run_once_prints_line_protocol() {
    let dir = setup();
    let output = Command::new(AGENT_BIN)
        .args(["--format", "text", "--config"])
        .arg(dir.path().join("agent.toml"))
        .args(["run", "--once"])
        .env("RUST_LOG", "info")
        .output()
        .unwrap();

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("demo,host=a value=42i,gathers=1u "),
        "{stdout}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hello from mock"), "{stderr}");
}

#[test]
fn test_discover_lists_mock_as_json() {
    let dir = setup();
    let output = Command::new(AGENT_BIN)
        .args(["--format", "json", "--plugin-dir"])
        .arg(dir.path().join("plugins"))
        .arg("discover")
        .env_remove("EXO_AGENT_CONFIG")
        .output()
        .unwrap();

    assert!(output.status.success(), "{output:?}");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["plugins"][0]["name"], "mock");
    assert_eq!(report["plugins"][0]["category"], "inputs");
    assert_eq!(report["plugins"][0]["status"], "unlisted");
}

#[test]
fn test_describe_unknown_plugin_exit_code() {
    let dir = setup();
    let output = Command::new(AGENT_BIN)
        .arg("--plugin-dir")
        .arg(dir.path().join("plugins"))
        .args(["describe", "ghost"])
        .env_remove("EXO_AGENT_CONFIG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_bad_format_is_rejected() {
    let output = Command::new(AGENT_BIN)
        .args(["--format", "xml", "completions", "bash"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
