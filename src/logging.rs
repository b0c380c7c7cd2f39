//! Logging facade (ambient stack; §7 "Expected errors").
//!
//! `tracing`/`tracing-subscriber` provide the actual logging backend; this
//! module only wires the subscriber once at startup and exposes the
//! `[EXPECTED]`-tag downgrade rule for tests with `expect_error_expected`.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSection;

/// Installs the global subscriber. Idempotent per process: a second call is
/// a no-op (returns `Err` from `tracing`'s own global-default guard, which
/// this function swallows).
pub fn init(section: &LoggingSection) {
    let filter = section
        .level
        .as_deref()
        .map(EnvFilter::new)
        .or_else(|| std::env::var("RUST_LOG").ok().map(EnvFilter::new))
        .unwrap_or_else(|| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if section.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    if let Err(e) = result {
        tracing::debug!("logging subscriber already installed: {e}");
    }
}

/// Logs a test error at the level its `expect_error_expected` flag implies:
/// DEBUG with an `[EXPECTED]` tag when the test declared it expected the
/// error, ERROR otherwise.
pub fn log_test_error(path_string: &str, message: &str, expected: bool) {
    if expected {
        tracing::debug!(target: "firmo::test", test = path_string, "[EXPECTED] {message}");
    } else {
        tracing::error!(target: "firmo::test", test = path_string, "{message}");
    }
}
