use std::fmt::Write;

use crate::error::FirmoError;
use crate::reporting::normalize::{FileEntry, NormalizedReport, ReportSummary, ReportType};
use crate::reporting::registry::Formatter;

pub struct CoberturaFormatter;

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

impl Formatter for CoberturaFormatter {
    fn name(&self) -> &str {
        "cobertura"
    }

    fn report_type(&self) -> ReportType {
        ReportType::Coverage
    }

    fn extension(&self) -> &str {
        "xml"
    }

    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError> {
        let ReportSummary::Coverage(overall) = &report.summary else {
            return Err(FirmoError::internal("cobertura formatter received a non-coverage summary"));
        };
        let line_rate = overall.coverage_percent / 100.0;
        let mut out = String::new();
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#).ok();
        writeln!(out, r#"<coverage line-rate="{line_rate:.4}" lines-covered="{}" lines-valid="{}" timestamp="{}">"#, overall.total_covered, overall.total_executable, report.generated_at.timestamp()).ok();
        writeln!(out, "  <packages>").ok();
        writeln!(out, r#"    <package name="firmo" line-rate="{line_rate:.4}">"#).ok();
        writeln!(out, "      <classes>").ok();
        for (path, entry) in report.files.iter().flatten() {
            let FileEntry::Coverage(summary) = entry else {
                continue;
            };
            let name = xml_escape(&path.display().to_string());
            writeln!(out, r#"        <class name="{name}" filename="{name}" line-rate="{:.4}">"#, summary.coverage_percent / 100.0).ok();
            writeln!(out, "          <lines>").ok();
            for (line, hits) in &summary.hits {
                writeln!(out, r#"            <line number="{line}" hits="{hits}"/>"#).ok();
            }
            writeln!(out, "          </lines>").ok();
            writeln!(out, "        </class>").ok();
        }
        writeln!(out, "      </classes>").ok();
        writeln!(out, "    </package>").ok();
        writeln!(out, "  </packages>").ok();
        writeln!(out, "</coverage>").ok();
        Ok(out)
    }
}
