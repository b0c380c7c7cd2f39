//! The `NormalizedReport` shape every formatter consumes (§3, §4.8).

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coverage::{CoverageReportData, FileCoverageSummary, OverallCoverageSummary};
use crate::error::FirmoError;
use crate::model::{FileResult, QualityReport, RunSummary, TestResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Coverage,
    Quality,
    Results,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Coverage => "coverage",
            ReportType::Quality => "quality",
            ReportType::Results => "results",
        }
    }
}

/// One summary shape per report type; `NormalizedReport::summary` always
/// matches `report_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportSummary {
    Results(RunSummary),
    Coverage(OverallCoverageSummary),
    Quality(crate::model::QualitySummary),
}

/// Per-file results-report entry: pass/fail counts without the full test
/// list (kept in `NormalizedReport::tests` instead, to avoid duplicating it
/// per file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResultSummary {
    pub success: bool,
    pub passes: usize,
    pub errors: usize,
    pub skipped: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileEntry {
    Results(FileResultSummary),
    Coverage(FileCoverageSummary),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedReport {
    pub report_type: ReportType,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<PathBuf, FileEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<TestResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityReport>,
}

pub fn from_results(file_results: &[FileResult], now: DateTime<Utc>) -> NormalizedReport {
    let summary = RunSummary::from_files(file_results);
    let files = file_results
        .iter()
        .map(|f| {
            (
                f.file_path.clone(),
                FileEntry::Results(FileResultSummary {
                    success: f.success,
                    passes: f.passes,
                    errors: f.errors,
                    skipped: f.skipped,
                    total: f.total,
                }),
            )
        })
        .collect();
    let tests = file_results.iter().flat_map(|f| f.results.iter().cloned()).collect();
    NormalizedReport {
        report_type: ReportType::Results,
        generated_at: now,
        summary: ReportSummary::Results(summary),
        files: Some(files),
        tests: Some(tests),
        quality: None,
    }
}

pub fn from_coverage(data: &CoverageReportData, now: DateTime<Utc>) -> NormalizedReport {
    let files = data
        .files
        .iter()
        .map(|(path, summary)| (path.clone(), FileEntry::Coverage(summary.clone())))
        .collect();
    NormalizedReport {
        report_type: ReportType::Coverage,
        generated_at: now,
        summary: ReportSummary::Coverage(data.summary.clone()),
        files: Some(files),
        tests: None,
        quality: None,
    }
}

pub fn from_quality(report: &QualityReport, now: DateTime<Utc>) -> NormalizedReport {
    NormalizedReport {
        report_type: ReportType::Quality,
        generated_at: now,
        summary: ReportSummary::Quality(report.summary.clone()),
        files: None,
        tests: None,
        quality: Some(report.clone()),
    }
}

/// Checks the summary variant and presence of the type-specific fields
/// match `report_type` before a formatter ever sees the report.
pub fn validate(report: &NormalizedReport) -> Result<(), FirmoError> {
    let mut issues = Vec::new();

    match (&report.report_type, &report.summary) {
        (ReportType::Results, ReportSummary::Results(_)) => {}
        (ReportType::Coverage, ReportSummary::Coverage(_)) => {}
        (ReportType::Quality, ReportSummary::Quality(_)) => {}
        _ => issues.push("summary shape does not match report_type".to_string()),
    }

    match report.report_type {
        ReportType::Results if report.tests.is_none() => issues.push("results report missing tests".to_string()),
        ReportType::Coverage if report.files.is_none() => issues.push("coverage report missing files".to_string()),
        ReportType::Quality if report.quality.is_none() => issues.push("quality report missing quality".to_string()),
        _ => {}
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(FirmoError::validation(format!("invalid report: {}", issues.join("; "))).with_context("issues", issues.join("\n")))
    }
}
