use std::fmt::Write;

use crate::error::FirmoError;
use crate::model::TestStatus;
use crate::reporting::normalize::{NormalizedReport, ReportSummary, ReportType};
use crate::reporting::registry::Formatter;

pub struct MarkdownFormatter {
    report_type: ReportType,
}

impl MarkdownFormatter {
    pub fn new(report_type: ReportType) -> Self {
        MarkdownFormatter { report_type }
    }
}

impl Formatter for MarkdownFormatter {
    fn name(&self) -> &str {
        "markdown"
    }

    fn report_type(&self) -> ReportType {
        self.report_type
    }

    fn extension(&self) -> &str {
        "md"
    }

    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError> {
        let mut out = String::new();
        match &report.summary {
            ReportSummary::Results(s) => {
                writeln!(out, "# Test results").ok();
                writeln!(out, "\n{} files, {} passed, {} failed, {} skipped, {} total\n", s.files, s.passes, s.errors, s.skipped, s.total).ok();
                writeln!(out, "| Test | Status | Time (s) |").ok();
                writeln!(out, "|---|---|---|").ok();
                for t in report.tests.as_deref().unwrap_or_default() {
                    let status = match t.status {
                        TestStatus::Pass => "pass",
                        TestStatus::Fail => "fail",
                        TestStatus::Skip => "skip",
                        TestStatus::Pending => "pending",
                    };
                    writeln!(out, "| {} | {} | {:.3} |", t.path_string, status, t.execution_time_s).ok();
                }
            }
            ReportSummary::Quality(s) => {
                writeln!(out, "# Quality report").ok();
                writeln!(out, "\nSuite achieves level {}; {}/{} tests pass the target level.\n", s.achieved_level, s.tests_passing_quality, s.tests_analyzed).ok();
                if let Some(quality) = &report.quality {
                    writeln!(out, "| Test | Achieved level | Issues |").ok();
                    writeln!(out, "|---|---|---|").ok();
                    for (path, tq) in &quality.per_test {
                        writeln!(out, "| {} | {} | {} |", path, tq.achieved, tq.issues.len()).ok();
                    }
                }
            }
            ReportSummary::Coverage(_) => unreachable!("markdown formatter is not registered for coverage"),
        }
        Ok(out)
    }
}
