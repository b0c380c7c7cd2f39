//! End-to-end CLI tests against the `firmo` binary, driven through
//! `host::FixtureLoader`'s JSON describe/it format (the binary's shipped
//! stand-in loader — see DESIGN.md).

use assert_cmd::Command;
use std::fs;

fn firmo_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_firmo"))
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, json: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, json).unwrap();
    path
}

/// Seed scenario 1: basic assertion and ordering.
#[test]
fn basic_suite_passes_in_registration_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_fixture(
        &dir,
        "math_test.json",
        r#"[{"describe": "math", "children": [
            {"it": "adds", "assert_eq": [4, 4]},
            {"it": "muls", "assert_eq": [6, 6]}
        ]}]"#,
    );

    let mut cmd = firmo_cmd();
    cmd.arg(&file).arg("--json");
    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let file_result = &parsed["files"][0];
    assert_eq!(file_result["total"], 2);
    assert_eq!(file_result["passes"], 2);
    assert_eq!(file_result["errors"], 0);
    assert_eq!(file_result["skipped"], 0);
    let names: Vec<&str> = file_result["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["path_string"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["math > adds", "math > muls"]);
}

/// Seed scenario 2: focus restricts the runnable set to focused items minus skipped.
#[test]
fn focus_restricts_run_to_focused_tests() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_fixture(
        &dir,
        "focus_test.json",
        r#"[
            {"describe": "A", "children": [
                {"it": "a1", "assert_eq": [1, 1]},
                {"it": "a2", "assert_eq": [1, 1], "focus": true},
                {"it": "a3", "assert_eq": [1, 1], "skip": true}
            ]},
            {"describe": "B", "children": [
                {"it": "b1", "assert_eq": [1, 1]}
            ]}
        ]"#,
    );

    let mut cmd = firmo_cmd();
    cmd.arg(&file).arg("--json");
    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let file_result = &parsed["files"][0];
    assert_eq!(file_result["passes"], 1);
    assert_eq!(file_result["skipped"], 3);
    assert_eq!(file_result["errors"], 0);
}

#[test]
fn failing_assertion_produces_nonzero_exit() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_fixture(
        &dir,
        "fail_test.json",
        r#"[{"describe": "s", "children": [{"it": "wrong", "assert_eq": [1, 2]}]}]"#,
    );

    let mut cmd = firmo_cmd();
    cmd.arg(&file);
    cmd.assert().failure();
}

#[test]
fn nonexistent_path_is_not_a_panic() {
    let mut cmd = firmo_cmd();
    cmd.arg("does/not/exist.json");
    cmd.assert().failure();
}

#[test]
fn create_config_writes_default_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cmd = firmo_cmd();
    cmd.current_dir(dir.path()).arg("--create-config");
    cmd.assert().success();
    assert!(dir.path().join(".firmo-config.json").exists());
}

/// Seed scenario 8: a `run` worker (as spawned by `--parallel`) emits a
/// FileResult bracketed by RESULTS_JSON_BEGIN/END alongside prose.
#[test]
fn run_subcommand_brackets_result_json_with_markers() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_fixture(
        &dir,
        "worker_test.json",
        r#"[{"describe": "s", "children": [{"it": "ok", "assert_eq": [1, 1]}]}]"#,
    );

    let mut cmd = firmo_cmd();
    cmd.arg("run").arg(&file);
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let begin = stdout.find("RESULTS_JSON_BEGIN").expect("begin marker present");
    let end = stdout.find("RESULTS_JSON_END").expect("end marker present");
    assert!(begin < end);
    let between = &stdout[begin + "RESULTS_JSON_BEGIN".len()..end];
    let parsed: serde_json::Value = serde_json::from_str(between.trim()).expect("valid bracketed JSON");
    assert_eq!(parsed["passes"], 1);
}

#[test]
fn console_format_dot_prints_one_char_per_test() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write_fixture(
        &dir,
        "dots_test.json",
        r#"[{"describe": "s", "children": [
            {"it": "a", "assert_eq": [1, 1]},
            {"it": "b", "assert_eq": [1, 2]}
        ]}]"#,
    );

    let mut cmd = firmo_cmd();
    cmd.arg(&file).arg("--console-format").arg("dot");
    let output = cmd.output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next().unwrap();
    let stripped = console::strip_ansi_codes(first_line);
    assert_eq!(stripped, ".F");
}
