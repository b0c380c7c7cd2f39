//! Self-contained HTML dashboard: results embedded as JSON, rendered
//! client-side with vanilla JS for filtering and sorting.

use serde::Serialize;

use crate::error::FirmoError;
use crate::model::TestStatus;
use crate::reporting::normalize::{NormalizedReport, ReportSummary, ReportType};
use crate::reporting::registry::Formatter;

fn escape_json_for_script(s: &str) -> String {
    s.replace("</script>", "<\\/script>")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsTest {
    path: String,
    status: String,
    time: f64,
    error: Option<String>,
    file: String,
}

pub struct HtmlFormatter;

impl Formatter for HtmlFormatter {
    fn name(&self) -> &str {
        "html"
    }

    fn report_type(&self) -> ReportType {
        ReportType::Results
    }

    fn extension(&self) -> &str {
        "html"
    }

    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError> {
        let ReportSummary::Results(summary) = &report.summary else {
            return Err(FirmoError::internal("html formatter received a non-results summary"));
        };
        let js_tests: Vec<JsTest> = report
            .tests
            .iter()
            .flatten()
            .map(|t| JsTest {
                path: t.path_string.clone(),
                status: match t.status {
                    TestStatus::Pass => "pass",
                    TestStatus::Fail => "fail",
                    TestStatus::Skip => "skip",
                    TestStatus::Pending => "pending",
                }
                .to_string(),
                time: t.execution_time_s,
                error: t.error_message.clone(),
                file: t.file_path.display().to_string(),
            })
            .collect();
        let data_json = serde_json::to_string(&js_tests).unwrap_or_else(|_| "[]".to_string());

        let mut html = String::with_capacity(8192);
        html.push_str(Self::template_head());
        html.push_str("<script>const DATA=");
        html.push_str(&escape_json_for_script(&data_json));
        html.push_str(";const STATS={files:");
        html.push_str(&summary.files.to_string());
        html.push_str(",passes:");
        html.push_str(&summary.passes.to_string());
        html.push_str(",errors:");
        html.push_str(&summary.errors.to_string());
        html.push_str(",skipped:");
        html.push_str(&summary.skipped.to_string());
        html.push_str(",total:");
        html.push_str(&summary.total.to_string());
        html.push_str("};</script>\n");
        html.push_str(Self::template_body());
        html.push_str(Self::template_script());
        Ok(html)
    }
}

impl HtmlFormatter {
    fn template_head() -> &'static str {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Test results</title>
<style>
body{font-family:sans-serif;margin:2rem;background:#0f1115;color:#e6e6e6}
table{border-collapse:collapse;width:100%}
td,th{padding:.4rem .6rem;border-bottom:1px solid #333;text-align:left}
.pass{color:#4caf50}.fail{color:#f44336}.skip{color:#999}.pending{color:#ffb300}
#summary{margin-bottom:1rem}
</style>
</head>
<body>
"#
    }

    fn template_body() -> &'static str {
        r#"<h1>Test results</h1>
<div id="summary"></div>
<table id="rows"><thead><tr><th>Test</th><th>Status</th><th>Time (s)</th><th>File</th></tr></thead><tbody></tbody></table>
"#
    }

    fn template_script() -> &'static str {
        r#"<script>
document.getElementById('summary').textContent =
  `${STATS.files} files, ${STATS.passes} passed, ${STATS.errors} failed, ${STATS.skipped} skipped (${STATS.total} total)`;
const body = document.querySelector('#rows tbody');
for (const t of DATA) {
  const tr = document.createElement('tr');
  tr.innerHTML = `<td>${t.path}</td><td class="${t.status}">${t.status}</td><td>${t.time.toFixed(3)}</td><td>${t.file}</td>`;
  body.appendChild(tr);
}
</script>
</body>
</html>
"#
    }
}
