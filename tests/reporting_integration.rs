//! Seed scenario 7: a run with 3 passes / 1 fail / 1 skip round-trips
//! through the JUnit and JSON formatters with matching counts.

use chrono::Utc;
use firmo::model::{FileResult, TestResult, TestStatus};
use firmo::reporting::{normalize, FormatterRegistry, ReportType};
use std::path::PathBuf;

fn result(name: &str, status: TestStatus) -> TestResult {
    TestResult {
        name: name.to_string(),
        path: vec!["suite".to_string(), name.to_string()],
        path_string: format!("suite > {name}"),
        status,
        error_message: if status == TestStatus::Fail { Some("expected 1 to equal 2".to_string()) } else { None },
        error_value: None,
        reason: None,
        execution_time_s: 0.001,
        file_path: PathBuf::from("suite_test.json"),
        expect_error_expected: false,
        tags: Vec::new(),
        matcher_categories: Vec::new(),
        assertion_count: if status == TestStatus::Pass { 1 } else { 0 },
        mock_leaks: 0,
        suite_uses_hooks: false,
    }
}

fn three_pass_one_fail_one_skip() -> Vec<FileResult> {
    let results = vec![
        result("a", TestStatus::Pass),
        result("b", TestStatus::Pass),
        result("c", TestStatus::Pass),
        result("d", TestStatus::Fail),
        result("e", TestStatus::Skip),
    ];
    vec![FileResult::from_results(PathBuf::from("suite_test.json"), results, 0.005)]
}

#[test]
fn junit_formatter_emits_five_testcases_and_one_failure() {
    let files = three_pass_one_fail_one_skip();
    let report = normalize::from_results(&files, Utc::now());
    let registry = FormatterRegistry::with_builtins();
    let (xml, ext) = registry.format(ReportType::Results, "junit", &report).unwrap();

    assert_eq!(ext, "xml");
    assert_eq!(xml.matches("<testcase ").count(), 5);
    assert_eq!(xml.matches("<failure ").count(), 1);
    assert_eq!(xml.matches("<skipped/>").count(), 1);
}

#[test]
fn json_formatter_round_trips_to_identical_summary_numbers() {
    let files = three_pass_one_fail_one_skip();
    let report = normalize::from_results(&files, Utc::now());
    let registry = FormatterRegistry::with_builtins();
    let (json, _ext) = registry.format(ReportType::Results, "json", &report).unwrap();

    let reloaded: normalize::NormalizedReport = serde_json::from_str(&json).unwrap();
    let normalize::ReportSummary::Results(original) = &report.summary else { panic!("results summary") };
    let normalize::ReportSummary::Results(round_tripped) = &reloaded.summary else { panic!("results summary") };
    assert_eq!(original.passes, round_tripped.passes);
    assert_eq!(original.errors, round_tripped.errors);
    assert_eq!(original.skipped, round_tripped.skipped);
    assert_eq!(original.total, round_tripped.total);
    assert_eq!(round_tripped.passes, 3);
    assert_eq!(round_tripped.errors, 1);
    assert_eq!(round_tripped.skipped, 1);
}

#[test]
fn write_atomic_leaves_prior_file_untouched_on_a_failed_write() {
    use firmo::reporting::write_atomic;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    std::fs::write(&path, "original").unwrap();

    write_atomic(&path, "updated").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "updated");

    // A target whose parent cannot be created (a file standing in its place)
    // fails the write and must leave the earlier file's contents intact.
    let blocked_parent = dir.path().join("blocked");
    std::fs::write(&blocked_parent, "im a file not a dir").unwrap();
    let blocked_path = blocked_parent.join("report.json");
    assert!(write_atomic(&blocked_path, "new contents").is_err());
}
