use std::fmt::Write;

use crate::error::FirmoError;
use crate::model::TestStatus;
use crate::reporting::normalize::{NormalizedReport, ReportType};
use crate::reporting::registry::Formatter;

pub struct CsvFormatter;

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

impl Formatter for CsvFormatter {
    fn name(&self) -> &str {
        "csv"
    }

    fn report_type(&self) -> ReportType {
        ReportType::Results
    }

    fn extension(&self) -> &str {
        "csv"
    }

    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError> {
        let mut out = String::new();
        writeln!(out, "path,status,execution_time_s,file_path").ok();
        for t in report.tests.iter().flatten() {
            let status = match t.status {
                TestStatus::Pass => "pass",
                TestStatus::Fail => "fail",
                TestStatus::Skip => "skip",
                TestStatus::Pending => "pending",
            };
            writeln!(
                out,
                "{},{},{:.3},{}",
                csv_field(&t.path_string),
                status,
                t.execution_time_s,
                csv_field(&t.file_path.display().to_string())
            )
            .ok();
        }
        Ok(out)
    }
}
