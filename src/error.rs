//! Structured error value shared by every module (C1).

use std::collections::BTreeMap;
use std::fmt;

/// The category a [`FirmoError`] belongs to.
///
/// Categories are the stable, machine-checkable part of an error; `message`
/// and `context` are for humans and formatters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// A matcher failed.
    Assertion,
    /// An API was used outside its required context (e.g. `await` outside async).
    Context,
    /// An async timeout or `wait_until` elapsed.
    Timeout,
    /// Bad config, invalid report data, or bad CLI arguments.
    Validation,
    /// Filesystem read/write failure.
    Io,
    /// Stub/verify mismatch or unrestored mock leak.
    Mock,
    /// Uncaught error inside a test or hook, not captured elsewhere.
    Execution,
    /// Programmer error in the framework itself.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Assertion => "ASSERTION",
            ErrorCategory::Context => "CONTEXT",
            ErrorCategory::Timeout => "TIMEOUT",
            ErrorCategory::Validation => "VALIDATION",
            ErrorCategory::Io => "IO",
            ErrorCategory::Mock => "MOCK",
            ErrorCategory::Execution => "EXECUTION",
            ErrorCategory::Internal => "INTERNAL",
        };
        f.write_str(s)
    }
}

/// A structured, category-tagged error value.
///
/// `context` carries the extra fields formatters need without re-parsing
/// `message` (e.g. `actual`/`expected`/`matcher`/`diff` for an ASSERTION
/// error).
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[error("{category}: {message}")]
pub struct FirmoError {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    #[serde(default)]
    pub cause: Option<Box<FirmoError>>,
}

impl FirmoError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            context: BTreeMap::new(),
            cause: None,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_cause(mut self, cause: FirmoError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Assertion, message)
    }

    pub fn context_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Context, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Timeout, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Io, message)
    }

    pub fn mock(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Mock, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Execution, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, message)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

impl From<std::io::Error> for FirmoError {
    fn from(e: std::io::Error) -> Self {
        FirmoError::io(e.to_string())
    }
}

impl From<serde_json::Error> for FirmoError {
    fn from(e: serde_json::Error) -> Self {
        FirmoError::validation(e.to_string())
    }
}

pub type FirmoResult<T> = Result<T, FirmoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category_and_message() {
        let e = FirmoError::assertion("expected 1 to equal 2");
        assert_eq!(e.to_string(), "ASSERTION: expected 1 to equal 2");
    }

    #[test]
    fn context_roundtrips() {
        let e = FirmoError::assertion("mismatch")
            .with_context("actual", "1")
            .with_context("expected", "2");
        assert_eq!(e.get("actual"), Some("1"));
        assert_eq!(e.get("expected"), Some("2"));
    }

    #[test]
    fn cause_chain_preserved() {
        let root = FirmoError::io("disk full");
        let wrapped = FirmoError::execution("write failed").with_cause(root);
        assert_eq!(wrapped.cause.unwrap().category, ErrorCategory::Io);
    }
}
