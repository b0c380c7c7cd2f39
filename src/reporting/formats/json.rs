use crate::error::FirmoError;
use crate::reporting::normalize::{NormalizedReport, ReportType};
use crate::reporting::registry::Formatter;

pub struct JsonFormatter {
    report_type: ReportType,
}

impl JsonFormatter {
    pub fn new(report_type: ReportType) -> Self {
        JsonFormatter { report_type }
    }
}

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn report_type(&self) -> ReportType {
        self.report_type
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError> {
        serde_json::to_string_pretty(report).map_err(FirmoError::from)
    }
}
