use std::fmt::Write;

use crate::error::FirmoError;
use crate::reporting::normalize::{FileEntry, NormalizedReport, ReportType};
use crate::reporting::registry::Formatter;

pub struct LcovFormatter;

impl Formatter for LcovFormatter {
    fn name(&self) -> &str {
        "lcov"
    }

    fn report_type(&self) -> ReportType {
        ReportType::Coverage
    }

    fn extension(&self) -> &str {
        "info"
    }

    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError> {
        let mut out = String::new();
        for (path, entry) in report.files.iter().flatten() {
            let FileEntry::Coverage(summary) = entry else {
                continue;
            };
            writeln!(out, "SF:{}", path.display()).ok();
            for (line, hits) in &summary.hits {
                writeln!(out, "DA:{line},{hits}").ok();
            }
            writeln!(out, "LF:{}", summary.executable_lines).ok();
            writeln!(out, "LH:{}", summary.covered_lines).ok();
            writeln!(out, "end_of_record").ok();
        }
        Ok(out)
    }
}
