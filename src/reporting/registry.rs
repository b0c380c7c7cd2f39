//! `(report_type, name) -> formatter` registry (§4.8).

use std::collections::HashMap;

use crate::error::FirmoError;

use super::normalize::{NormalizedReport, ReportType};

pub trait Formatter {
    fn name(&self) -> &str;
    fn report_type(&self) -> ReportType;
    fn extension(&self) -> &str;
    fn format(&self, report: &NormalizedReport) -> Result<String, FirmoError>;
}

enum Registration {
    Value(Box<dyn Formatter>),
    Factory(Box<dyn Fn() -> Box<dyn Formatter>>),
}

/// Maps `(report_type, name)` to a formatter. Registration accepts either a
/// ready-made formatter value or a factory, so a caller can defer
/// construction (e.g. a formatter that reads its own config at build time).
pub struct FormatterRegistry {
    entries: HashMap<(ReportType, String), Registration>,
}

impl FormatterRegistry {
    pub fn empty() -> Self {
        FormatterRegistry { entries: HashMap::new() }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        super::formats::register_builtins(&mut registry);
        registry
    }

    pub fn register(&mut self, formatter: Box<dyn Formatter>) {
        let key = (formatter.report_type(), formatter.name().to_string());
        self.entries.insert(key, Registration::Value(formatter));
    }

    pub fn register_factory(&mut self, report_type: ReportType, name: &str, factory: Box<dyn Fn() -> Box<dyn Formatter>>) {
        self.entries.insert((report_type, name.to_string()), Registration::Factory(factory));
    }

    fn resolve(&self, report_type: ReportType, name: &str) -> Option<Box<dyn Formatter>> {
        match self.entries.get(&(report_type, name.to_string()))? {
            Registration::Value(_) => None, // handled in `format` directly to avoid cloning trait objects
            Registration::Factory(f) => Some(f()),
        }
    }

    pub fn names_for(&self, report_type: ReportType) -> Vec<String> {
        self.entries.keys().filter(|(t, _)| *t == report_type).map(|(_, n)| n.clone()).collect()
    }

    pub fn format(&self, report_type: ReportType, name: &str, report: &NormalizedReport) -> Result<(String, String), FirmoError> {
        super::normalize::validate(report)?;
        match self.entries.get(&(report_type, name.to_string())) {
            Some(Registration::Value(f)) => Ok((f.format(report)?, f.extension().to_string())),
            Some(Registration::Factory(_)) => {
                let f = self.resolve(report_type, name).expect("factory entry just matched");
                Ok((f.format(report)?, f.extension().to_string()))
            }
            None => Err(FirmoError::validation(format!(
                "no formatter named {name:?} registered for report type {}",
                report_type.as_str()
            ))),
        }
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_formatter_is_a_validation_error() {
        let registry = FormatterRegistry::empty();
        let report = super::super::normalize::from_results(&[], chrono::Utc::now());
        let err = registry.format(ReportType::Results, "nonexistent", &report).unwrap_err();
        assert_eq!(err.category, crate::error::ErrorCategory::Validation);
    }

    #[test]
    fn builtins_cover_every_report_type() {
        let registry = FormatterRegistry::with_builtins();
        assert!(!registry.names_for(ReportType::Results).is_empty());
        assert!(!registry.names_for(ReportType::Coverage).is_empty());
        assert!(!registry.names_for(ReportType::Quality).is_empty());
    }
}
