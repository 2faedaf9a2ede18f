//! End-to-end tests against the compiled binary.

mod common;

use common::{fixture_path, spawn_command};
use serde_json::Value;

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn path_arg(name: &str) -> String {
    fixture_path(name).display().to_string()
}

#[test]
fn test_version_human_and_json() {
    let output = spawn_command(&["version"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("islandclash "));

    let output = spawn_command(&["version", "--format", "json"]);
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["name"], "islandclash");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_validate_valid_file() {
    let output = spawn_command(&["--quiet", "validate", &path_arg("full_match.yaml")]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("full_match.yaml: ok"));
}

#[test]
fn test_validate_invalid_file_exits_with_config_error() {
    let output = spawn_command(&["--quiet", "validate", &path_arg("invalid_values.yaml")]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tick.rate_hz"), "{stderr}");
}

#[test]
fn test_validate_json_reports_every_file() {
    let output = spawn_command(&[
        "--quiet",
        "validate",
        "--format",
        "json",
        &path_arg("minimal.yaml"),
        &path_arg("warnings.yaml"),
        &path_arg("empty.yaml"),
    ]);
    assert_eq!(output.status.code(), Some(2));

    let reports: Value = serde_json::from_str(&stdout(&output)).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0]["valid"], true);
    assert_eq!(reports[1]["valid"], true);
    assert_eq!(reports[1]["warnings"].as_array().unwrap().len(), 2);
    assert_eq!(reports[2]["valid"], false);
}

#[test]
fn test_validate_strict_fails_on_warnings() {
    let lenient = spawn_command(&["--quiet", "validate", &path_arg("warnings.yaml")]);
    assert!(lenient.status.success());
    assert!(stdout(&lenient).contains("warning:"));

    let strict = spawn_command(&["--quiet", "validate", "--strict", &path_arg("warnings.yaml")]);
    assert_eq!(strict.status.code(), Some(2));
}

#[test]
fn test_validate_missing_file() {
    let output = spawn_command(&["--quiet", "validate", "does-not-exist.yaml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does-not-exist.yaml"), "{stderr}");
}

#[test]
fn test_status_on_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().display().to_string();

    let output = spawn_command(&["status", "--data-dir", &data_dir]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("phase: LOBBY (0 ticks elapsed)"), "{text}");
    assert!(text.contains("no teams stored"));
}

#[test]
fn test_run_persists_documents_and_events() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let events = dir.path().join("events.jsonl");

    let output = spawn_command(&[
        "--quiet",
        "run",
        "--config",
        &path_arg("full_match.yaml"),
        "--data-dir",
        &data_dir.display().to_string(),
        "--events-file",
        &events.display().to_string(),
        "--stop-after",
        "300ms",
    ]);
    assert!(output.status.success(), "{output:?}");

    for name in ["phase-state.json", "teams.json", "territories.json"] {
        assert!(data_dir.join(name).exists(), "{name} missing");
    }

    let lines: Vec<Value> = std::fs::read_to_string(&events)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.first().unwrap()["type"], "MatchStarted");
    assert_eq!(lines.last().unwrap()["type"], "MatchStopped");

    let status = spawn_command(&[
        "status",
        "--data-dir",
        &data_dir.display().to_string(),
        "--format",
        "json",
    ]);
    assert!(status.status.success());
    let report: Value = serde_json::from_str(&stdout(&status)).unwrap();
    assert_eq!(report["phase"], "LOBBY");
    assert!(report["elapsedTicks"].as_u64().unwrap() > 0);
    assert_eq!(report["teams"].as_array().unwrap().len(), 5);
}
