use crate::error::FirmoError;
use crate::reporting::normalize::{NormalizedReport, ReportSummary, ReportType};
use crate::reporting::registry::Formatter;

pub struct TextSummaryFormatter {
    report_type: ReportType,
}

impl TextSummaryFormatter {
    pub fn new(report_type: ReportType) -> Self {
        TextSummaryFormatter { report_type }
    }
}

impl Formatter for TextSummaryFormatter {
    fn name(&self) -> &str {
        "summary"
    }

    fn report_type(&self) -> ReportType {
        self.report_type
    }

    fn extension(&self) -> &str {
        "txt"
    }

    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError> {
        let body = match &report.summary {
            ReportSummary::Results(s) => format!(
                "{} files, {} passed, {} failed, {} skipped ({} total)",
                s.files, s.passes, s.errors, s.skipped, s.total
            ),
            ReportSummary::Coverage(s) => format!(
                "{}/{} lines covered ({:.1}%)",
                s.total_covered, s.total_executable, s.coverage_percent
            ),
            ReportSummary::Quality(s) => format!(
                "{}/{} tests passing quality, suite at level {}",
                s.tests_passing_quality, s.tests_analyzed, s.achieved_level
            ),
        };
        Ok(format!("{} report generated at {}\n{body}\n", report.report_type.as_str(), report.generated_at.to_rfc3339()))
    }
}
