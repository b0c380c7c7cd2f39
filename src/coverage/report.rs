//! `get_report_data()` (§4.6): a stable snapshot for Reporting/Quality.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::CoverageDatum;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCoverageSummary {
    pub executable_lines: u64,
    pub covered_lines: u64,
    pub hits: BTreeMap<u64, u64>,
    pub coverage_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallCoverageSummary {
    pub total_executable: u64,
    pub total_covered: u64,
    pub coverage_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReportData {
    pub files: BTreeMap<PathBuf, FileCoverageSummary>,
    pub summary: OverallCoverageSummary,
}

fn percent(covered: u64, executable: u64) -> f64 {
    if executable == 0 {
        100.0
    } else {
        (covered as f64 / executable as f64) * 100.0
    }
}

pub(super) fn build_report(data: &std::collections::HashMap<PathBuf, CoverageDatum>) -> CoverageReportData {
    let mut files = BTreeMap::new();
    let mut total_executable = 0;
    let mut total_covered = 0;

    for (path, datum) in data {
        let executable_lines = datum.hits.len() as u64;
        let covered_lines = datum.hits.values().filter(|&&c| c > 0).count() as u64;
        total_executable += executable_lines;
        total_covered += covered_lines;
        files.insert(
            path.clone(),
            FileCoverageSummary {
                executable_lines,
                covered_lines,
                hits: datum.hits.clone(),
                coverage_percent: percent(covered_lines, executable_lines),
            },
        );
    }

    CoverageReportData {
        files,
        summary: OverallCoverageSummary {
            total_executable,
            total_covered,
            coverage_percent: percent(total_covered, total_executable),
        },
    }
}

pub fn covered_lines_sum_matches_summary(report: &CoverageReportData) -> bool {
    let sum: u64 = report.files.values().map(|f| f.covered_lines).sum();
    sum == report.summary.total_covered
}
