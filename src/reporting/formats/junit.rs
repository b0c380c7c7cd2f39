use std::collections::BTreeMap;
use std::fmt::Write;

use crate::error::FirmoError;
use crate::model::{TestResult, TestStatus};
use crate::reporting::normalize::{NormalizedReport, ReportSummary, ReportType};
use crate::reporting::registry::Formatter;

pub struct JUnitFormatter;

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

impl Formatter for JUnitFormatter {
    fn name(&self) -> &str {
        "junit"
    }

    fn report_type(&self) -> ReportType {
        ReportType::Results
    }

    fn extension(&self) -> &str {
        "xml"
    }

    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError> {
        let ReportSummary::Results(summary) = &report.summary else {
            return Err(FirmoError::internal("junit formatter received a non-results summary"));
        };
        let tests = report.tests.as_deref().unwrap_or_default();
        let mut by_file: BTreeMap<String, Vec<&TestResult>> = BTreeMap::new();
        for t in tests {
            by_file.entry(t.file_path.display().to_string()).or_default().push(t);
        }

        let mut out = String::new();
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#).ok();
        writeln!(out, r#"<testsuites tests="{}" failures="{}" skipped="{}">"#, summary.total, summary.errors, summary.skipped).ok();
        for (file, file_tests) in &by_file {
            let failures = file_tests.iter().filter(|t| t.status == TestStatus::Fail).count();
            let skipped = file_tests.iter().filter(|t| t.status == TestStatus::Skip || t.status == TestStatus::Pending).count();
            writeln!(
                out,
                r#"  <testsuite name="{}" tests="{}" failures="{}" skipped="{}">"#,
                xml_escape(file),
                file_tests.len(),
                failures,
                skipped
            )
            .ok();
            for t in file_tests {
                writeln!(out, r#"    <testcase name="{}" time="{:.3}">"#, xml_escape(&t.path_string), t.execution_time_s).ok();
                match t.status {
                    TestStatus::Fail => {
                        let message = t.error_message.clone().unwrap_or_else(|| "assertion failed".to_string());
                        writeln!(out, r#"      <failure message="{}">{}</failure>"#, xml_escape(&message), xml_escape(&message)).ok();
                    }
                    TestStatus::Skip | TestStatus::Pending => {
                        writeln!(out, "      <skipped/>").ok();
                    }
                    TestStatus::Pass => {}
                }
                writeln!(out, "    </testcase>").ok();
            }
            writeln!(out, "  </testsuite>").ok();
        }
        writeln!(out, "</testsuites>").ok();
        Ok(out)
    }
}
