//! Shared result types (§3): `TestResult`, `FileResult`, and the small value
//! objects quality/reporting build on top of them.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::FirmoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
    Pending,
}

/// The immutable, structured outcome of one executed test. Produced exactly
/// once; never mutated after emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub path: Vec<String>,
    pub path_string: String,
    pub status: TestStatus,
    pub error_message: Option<String>,
    pub error_value: Option<FirmoError>,
    pub reason: Option<String>,
    pub execution_time_s: f64,
    pub file_path: PathBuf,
    pub expect_error_expected: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub matcher_categories: Vec<String>,
    #[serde(default)]
    pub assertion_count: usize,
    /// Mocks still un-restored at teardown time, before the Runner's forced
    /// restore. Used by Quality's "no leaks" check (Level 5).
    #[serde(default)]
    pub mock_leaks: usize,
    /// Whether an enclosing suite registered `before`/`after` (Quality
    /// Level 3 "suite uses before/after").
    #[serde(default)]
    pub suite_uses_hooks: bool,
}

impl TestResult {
    pub fn path_string(path: &[String]) -> String {
        path.join(" > ")
    }
}

/// Per-file aggregate. Invariant: `passes + errors + skipped == total`;
/// `success` implies `errors == 0` and no `execution_error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub file_path: PathBuf,
    pub success: bool,
    pub passes: usize,
    pub errors: usize,
    pub skipped: usize,
    pub total: usize,
    pub elapsed_s: f64,
    pub results: Vec<TestResult>,
    pub execution_error: Option<FirmoError>,
    #[serde(default)]
    pub empty_describes: Vec<String>,
}

impl FileResult {
    pub fn from_results(file_path: PathBuf, results: Vec<TestResult>, elapsed_s: f64) -> Self {
        let passes = results.iter().filter(|r| r.status == TestStatus::Pass).count();
        let errors = results.iter().filter(|r| r.status == TestStatus::Fail).count();
        let skipped = results
            .iter()
            .filter(|r| matches!(r.status, TestStatus::Skip | TestStatus::Pending))
            .count();
        let total = results.len();
        FileResult {
            file_path,
            success: errors == 0,
            passes,
            errors,
            skipped,
            total,
            elapsed_s,
            results,
            execution_error: None,
            empty_describes: Vec::new(),
        }
    }

    pub fn structural_failure(file_path: PathBuf, error: FirmoError, elapsed_s: f64) -> Self {
        let synthetic = TestResult {
            name: "<file evaluation>".to_string(),
            path: vec![file_path.display().to_string()],
            path_string: file_path.display().to_string(),
            status: TestStatus::Fail,
            error_message: Some(error.message.clone()),
            error_value: Some(error.clone()),
            reason: None,
            execution_time_s: elapsed_s,
            file_path: file_path.clone(),
            expect_error_expected: false,
            tags: Vec::new(),
            matcher_categories: Vec::new(),
            assertion_count: 0,
            mock_leaks: 0,
            suite_uses_hooks: false,
        };
        FileResult {
            file_path,
            success: false,
            passes: 0,
            errors: 1,
            skipped: 0,
            total: 1,
            elapsed_s,
            results: vec![synthetic],
            execution_error: Some(error),
            empty_describes: Vec::new(),
        }
    }
}

/// Aggregate over every file in a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub files: usize,
    pub passes: usize,
    pub errors: usize,
    pub skipped: usize,
    pub total: usize,
    pub all_passed: bool,
}

impl RunSummary {
    pub fn from_files(results: &[FileResult]) -> Self {
        let mut summary = RunSummary {
            files: results.len(),
            ..Default::default()
        };
        for f in results {
            summary.passes += f.passes;
            summary.errors += f.errors;
            summary.skipped += f.skipped;
            summary.total += f.total;
        }
        summary.all_passed = results.iter().all(|f| f.success && f.execution_error.is_none());
        summary
    }
}

/// Per-file line coverage (§4.6 `get_report_data`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageDatum {
    pub hits: BTreeMap<u64, u64>,
    pub max_line: u64,
}

/// Per-test quality assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestQuality {
    pub achieved: u8,
    pub issues: Vec<QualityIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub category: String,
    pub message: String,
    pub example_fix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySummary {
    pub tests_analyzed: usize,
    pub tests_passing_quality: usize,
    pub assertion_type_distribution: BTreeMap<String, usize>,
    pub achieved_level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub target_level: u8,
    pub per_test: BTreeMap<String, TestQuality>,
    pub summary: QualitySummary,
    pub structural_issues: Vec<QualityIssue>,
}

/// A path of suite/test names from root to leaf.
pub type TestPath = Vec<String>;

pub fn distinct_tags(results: &[TestResult]) -> HashSet<String> {
    results.iter().flat_map(|r| r.tags.iter().cloned()).collect()
}
