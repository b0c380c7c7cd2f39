//! Mock-of-table: replaces fields of a host table with spies and restores
//! them atomically (C5).

use crate::error::FirmoError;
use crate::value::Value;

use super::spy::Spy;

/// Matches the argument list of a recorded call, for `verify()` expectations.
pub enum ArgMatcher {
    Any,
    Exact(Vec<Value>),
    Predicate(Box<dyn Fn(&[Value]) -> bool>),
}

impl ArgMatcher {
    fn matches(&self, args: &[Value]) -> bool {
        match self {
            ArgMatcher::Any => true,
            ArgMatcher::Exact(expected) => {
                expected.len() == args.len()
                    && expected
                        .iter()
                        .zip(args)
                        .all(|(a, b)| crate::value::deep_equal(a, b))
            }
            ArgMatcher::Predicate(f) => f(args),
        }
    }
}

/// `expect(field).with(matcher).to.be.called.times(n)`.
pub struct Expectation {
    pub field: String,
    pub matcher: ArgMatcher,
    pub times: usize,
}

/// A failed expectation, as reported by [`Mock::verify`].
pub struct ExpectationFailure {
    pub field: String,
    pub expected_times: usize,
    pub actual_times: usize,
}

struct StubbedField {
    name: String,
    original: Value,
    spy: Spy,
}

/// Wraps a `Value::Table`, replacing fields with spies/stubs and able to
/// restore the originals atomically.
pub struct Mock {
    table: Value,
    stubbed: Vec<StubbedField>,
    expectations: Vec<Expectation>,
    restored: bool,
}

impl Mock {
    pub fn new(table: Value) -> Self {
        Mock {
            table,
            stubbed: Vec::new(),
            expectations: Vec::new(),
            restored: false,
        }
    }

    /// Replaces `field` on the wrapped table with `spy`, recording the
    /// original value so it can be restored.
    pub fn stub(&mut self, field: &str, spy: Spy) -> Result<(), FirmoError> {
        let Value::Table(t) = &self.table else {
            return Err(FirmoError::mock(format!(
                "cannot stub field {field:?} on a non-table value"
            )));
        };
        let mut borrowed = t.borrow_mut();
        let original = borrowed
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Nil);
        let new_value = Value::Callable(spy.clone());
        if let Some(entry) = borrowed.iter_mut().find(|(k, _)| k == field) {
            entry.1 = new_value;
        } else {
            borrowed.push((field.to_string(), new_value));
        }
        drop(borrowed);
        self.stubbed.push(StubbedField {
            name: field.to_string(),
            original,
            spy,
        });
        Ok(())
    }

    pub fn expect(&mut self, field: &str, matcher: ArgMatcher, times: usize) {
        self.expectations.push(Expectation {
            field: field.to_string(),
            matcher,
            times,
        });
    }

    /// Restores every stubbed field to its pre-mock value. Idempotent: a
    /// second call is a no-op rather than an error.
    pub fn restore(&mut self) {
        if self.restored {
            return;
        }
        if let Value::Table(t) = &self.table {
            let mut borrowed = t.borrow_mut();
            for field in &self.stubbed {
                if let Some(entry) = borrowed.iter_mut().find(|(k, _)| k == field.name.as_str()) {
                    entry.1 = field.original.clone();
                }
            }
        }
        self.restored = true;
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }

    fn spy_for(&self, field: &str) -> Option<&Spy> {
        self.stubbed.iter().find(|s| s.name == field).map(|s| &s.spy)
    }

    /// Checks every registered expectation against recorded calls, returning
    /// a MOCK error listing mismatches when any fail.
    pub fn verify(&self) -> Result<(), FirmoError> {
        crate::assertion::record_matcher(crate::assertion::MatcherCategory::Mock);
        let mut failures = Vec::new();
        for expectation in &self.expectations {
            let Some(spy) = self.spy_for(&expectation.field) else {
                failures.push(ExpectationFailure {
                    field: expectation.field.clone(),
                    expected_times: expectation.times,
                    actual_times: 0,
                });
                continue;
            };
            let actual = spy
                .calls()
                .iter()
                .filter(|c| expectation.matcher.matches(&c.args))
                .count();
            if actual != expectation.times {
                failures.push(ExpectationFailure {
                    field: expectation.field.clone(),
                    expected_times: expectation.times,
                    actual_times: actual,
                });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            let summary = failures
                .iter()
                .map(|f| {
                    format!(
                        "{}: expected {} call(s), got {}",
                        f.field, f.expected_times, f.actual_times
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            Err(FirmoError::mock(format!("mock verification failed: {summary}")))
        }
    }
}

impl Drop for Mock {
    fn drop(&mut self) {
        self.restore();
    }
}
