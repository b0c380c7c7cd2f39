//! Built-in formatters (§4.8): HTML, JSON, LCOV, Cobertura XML, JUnit XML,
//! TAP, CSV, Markdown, and a text summary.

mod cobertura;
mod csv;
mod html;
mod json;
mod junit;
mod lcov;
mod markdown;
mod tap;
mod text;

use super::normalize::ReportType;
use super::registry::FormatterRegistry;

pub(super) fn register_builtins(registry: &mut FormatterRegistry) {
    for report_type in [ReportType::Results, ReportType::Coverage, ReportType::Quality] {
        registry.register(Box::new(json::JsonFormatter::new(report_type)));
        registry.register(Box::new(text::TextSummaryFormatter::new(report_type)));
    }
    registry.register(Box::new(html::HtmlFormatter));
    registry.register(Box::new(junit::JUnitFormatter));
    registry.register(Box::new(tap::TapFormatter));
    registry.register(Box::new(csv::CsvFormatter));
    registry.register(Box::new(markdown::MarkdownFormatter::new(ReportType::Results)));
    registry.register(Box::new(markdown::MarkdownFormatter::new(ReportType::Quality)));
    registry.register(Box::new(lcov::LcovFormatter));
    registry.register(Box::new(cobertura::CoberturaFormatter));
}
