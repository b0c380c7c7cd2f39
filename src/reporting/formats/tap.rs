use std::fmt::Write;

use crate::error::FirmoError;
use crate::model::TestStatus;
use crate::reporting::normalize::{NormalizedReport, ReportType};
use crate::reporting::registry::Formatter;

/// TAP version 14 output: plan line, one `ok`/`not ok` per test, `# SKIP`
/// directives for skipped tests, and a YAML diagnostic block under each
/// failure.
pub struct TapFormatter;

impl Formatter for TapFormatter {
    fn name(&self) -> &str {
        "tap"
    }

    fn report_type(&self) -> ReportType {
        ReportType::Results
    }

    fn extension(&self) -> &str {
        "tap"
    }

    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError> {
        let tests = report.tests.as_deref().unwrap_or_default();
        let mut out = String::new();
        writeln!(out, "TAP version 14").ok();
        writeln!(out, "1..{}", tests.len()).ok();
        for (i, t) in tests.iter().enumerate() {
            let n = i + 1;
            match t.status {
                TestStatus::Pass => {
                    writeln!(out, "ok {n} - {}", t.path_string).ok();
                }
                TestStatus::Fail => {
                    writeln!(out, "not ok {n} - {}", t.path_string).ok();
                    writeln!(out, "  ---").ok();
                    writeln!(out, "  message: {}", t.error_message.as_deref().unwrap_or("assertion failed")).ok();
                    writeln!(out, "  file: {}", t.file_path.display()).ok();
                    writeln!(out, "  ...").ok();
                }
                TestStatus::Skip => {
                    let reason = t.reason.as_deref().unwrap_or("skipped");
                    writeln!(out, "ok {n} - {} # SKIP {reason}", t.path_string).ok();
                }
                TestStatus::Pending => {
                    writeln!(out, "ok {n} - {} # TODO pending", t.path_string).ok();
                }
            }
        }
        Ok(out)
    }
}
