//! `expect(v)` DSL: chain accumulator, negation, matcher table (C2).
//!
//! The dynamic connector/matcher chain (`expect(v).to.be.a("table")`) maps
//! here to a builder that accumulates `(negated, chain_path)` and a flat,
//! explicit set of terminal matcher methods — no metaprogramming, per
//! SPEC_FULL.md's design notes.

mod matchers;
pub(crate) mod recorder;
mod schema;

pub use recorder::{record_matcher, take_recorded, AssertionRecorder, MatcherCategory};
pub use schema::Schema;

use crate::error::{ErrorCategory, FirmoError};
use crate::value::{deep_equal as value_deep_equal, diff as value_diff, render_value, Value};

/// An in-progress assertion chain. Connectors consume and return `Self`;
/// matchers are terminal and return a `Result`.
pub struct Expectation {
    value: Value,
    negated: bool,
    chain: Vec<String>,
}

/// Entry point: `expect(value)`.
pub fn expect(value: Value) -> Expectation {
    Expectation {
        value,
        negated: false,
        chain: Vec::new(),
    }
}

impl Expectation {
    fn push(mut self, token: &str) -> Self {
        self.chain.push(token.to_string());
        self
    }

    /// Pure connector: narrows nothing, just normalizes the chain text used
    /// in failure messages (`be.a(x)` reads identically to `be_a(x)`).
    pub fn to(self) -> Self {
        self.push("to")
    }

    /// Toggles negation. Calling it twice in one chain is idempotent with
    /// respect to final negation state only if called an even number of
    /// times overall — each call flips, matching "negation inverts exactly
    /// once per terminal matcher call" when used as `to_not`.
    pub fn to_not(mut self) -> Self {
        self.negated = !self.negated;
        self.push("to_not")
    }

    pub fn not(self) -> Self {
        self.to_not()
    }

    pub fn be(self) -> Self {
        self.push("be")
    }
    pub fn a(self) -> Self {
        self.push("a")
    }
    pub fn an(self) -> Self {
        self.push("an")
    }
    pub fn have(self) -> Self {
        self.push("have")
    }
    pub fn start_with_connector(self) -> Self {
        self.push("start_with")
    }

    fn fail(&self, matcher: &str, message: String, actual: &Value, expected: Option<&Value>) -> FirmoError {
        let mut err = FirmoError::new(ErrorCategory::Assertion, message)
            .with_context("matcher", matcher)
            .with_context("actual", render_value(actual))
            .with_context("negated", self.negated.to_string());
        if let Some(exp) = expected {
            err = err.with_context("expected", render_value(exp));
            if let Some(d) = value_diff(actual, exp) {
                err = err.with_context("diff", d);
            }
        }
        err
    }

    /// Applies negation: `ok` is the matcher's raw (un-negated) verdict.
    fn resolve(&self, ok: bool, matcher: &str, message: impl FnOnce() -> String, expected: Option<&Value>) -> Result<(), FirmoError> {
        record_matcher(matchers::category_for(matcher));
        let passed = ok != self.negated;
        if passed {
            Ok(())
        } else {
            let rendered = if self.negated {
                format!("expected {} not to {}", render_value(&self.value), message())
            } else {
                format!("expected {} to {}", render_value(&self.value), message())
            };
            Err(self.fail(matcher, rendered, &self.value, expected))
        }
    }

    // ---- equality ----

    pub fn equal(&self, other: Value) -> Result<(), FirmoError> {
        let ok = matchers::structural_or_scalar_equal(&self.value, &other);
        self.resolve(ok, "equal", || format!("equal {}", render_value(&other)), Some(&other))
    }

    pub fn deep_equal(&self, other: Value) -> Result<(), FirmoError> {
        let ok = value_deep_equal(&self.value, &other);
        self.resolve(ok, "deep_equal", || format!("deep_equal {}", render_value(&other)), Some(&other))
    }

    // ---- existence / truthiness ----

    pub fn exist(&self) -> Result<(), FirmoError> {
        self.resolve(!self.value.is_nil(), "exist", || "exist".to_string(), None)
    }

    pub fn be_truthy(&self) -> Result<(), FirmoError> {
        self.resolve(self.value.is_truthy(), "be_truthy", || "be truthy".to_string(), None)
    }

    pub fn be_nil(&self) -> Result<(), FirmoError> {
        self.resolve(self.value.is_nil(), "be_nil", || "be nil".to_string(), None)
    }

    // ---- type ----

    pub fn be_a(&self, type_name: &str) -> Result<(), FirmoError> {
        let ok = self.value.type_name() == type_name;
        self.resolve(ok, "be_a", || format!("be a {type_name}"), Some(&Value::str(type_name)))
    }

    // ---- pattern / regex ----

    pub fn match_pattern(&self, pattern: &str) -> Result<(), FirmoError> {
        let ok = match self.value.as_str() {
            Some(s) => matchers::host_pattern_matches(pattern, s),
            None => false,
        };
        self.resolve(ok, "match", || format!("match pattern {pattern:?}"), Some(&Value::str(pattern)))
    }

    pub fn match_regex(&self, pattern: &str) -> Result<(), FirmoError> {
        let re = regex::Regex::new(pattern)
            .map_err(|e| FirmoError::validation(format!("invalid regex {pattern:?}: {e}")))?;
        let ok = self.value.as_str().is_some_and(|s| re.is_match(s));
        self.resolve(ok, "match_regex", || format!("match regex {pattern:?}"), Some(&Value::str(pattern)))
    }

    // ---- collections ----

    pub fn have_length(&self, n: usize) -> Result<(), FirmoError> {
        let actual_len = self.value.length();
        let ok = actual_len == Some(n);
        self.resolve(
            ok,
            "have_length",
            || format!("have length {n}"),
            Some(&Value::Number(n as f64)),
        )
    }

    pub fn have_property(&self, key: &str, expected: Option<Value>) -> Result<(), FirmoError> {
        let found = self.value.get_property(key);
        let ok = match (&found, &expected) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(exp)) => matchers::structural_or_scalar_equal(actual, exp),
        };
        self.resolve(
            ok,
            "have_property",
            || format!("have property {key:?}"),
            expected.as_ref(),
        )
    }

    pub fn match_schema(&self, schema: &Schema) -> Result<(), FirmoError> {
        let ok = schema.matches(&self.value);
        self.resolve(ok, "match_schema", || "match schema".to_string(), None)
    }

    // ---- numeric ----

    pub fn be_greater_than(&self, n: f64) -> Result<(), FirmoError> {
        let ok = self.value.as_number().is_some_and(|v| v > n);
        self.resolve(ok, "be_greater_than", || format!("be greater than {n}"), Some(&Value::Number(n)))
    }

    pub fn be_less_than(&self, n: f64) -> Result<(), FirmoError> {
        let ok = self.value.as_number().is_some_and(|v| v < n);
        self.resolve(ok, "be_less_than", || format!("be less than {n}"), Some(&Value::Number(n)))
    }

    pub fn be_approximately(&self, n: f64, eps: f64) -> Result<(), FirmoError> {
        let ok = self.value.as_number().is_some_and(|v| (v - n).abs() <= eps);
        self.resolve(
            ok,
            "be_approximately",
            || format!("be approximately {n} (±{eps})"),
            Some(&Value::Number(n)),
        )
    }

    // ---- errors ----

    /// Invokes the wrapped callable and inspects the raised error's
    /// rendered message against `pattern` (host pattern, not regex).
    pub fn throw_error_matching(&self, pattern: &str) -> Result<(), FirmoError> {
        let Value::Callable(spy) = &self.value else {
            return Err(FirmoError::context_error("throw_error_matching requires a callable value"));
        };
        let result = spy.call(&[]);
        record_matcher(MatcherCategory::Error);
        let ok = match &result {
            Err(e) => matchers::host_pattern_matches(pattern, &e.message),
            Ok(_) => false,
        };
        let passed = ok != self.negated;
        if passed {
            Ok(())
        } else if result.is_ok() {
            Err(FirmoError::assertion("expected callable to throw, but it did not"))
        } else {
            Err(FirmoError::assertion(format!(
                "expected thrown error to match {pattern:?}, got {:?}",
                result.err().unwrap().message
            )))
        }
    }

    // ---- change / increase / decrease ----

    /// `self.value` is the probe callable; `subject` is the action to run
    /// between the before/after snapshots. Negation defers to `resolve` so
    /// `to_not.change(subject)` still runs `subject` exactly once and just
    /// flips the verdict, rather than re-running it to "re-check".
    fn probe_callable(&self, matcher: &str) -> Result<&crate::mocking::Spy, FirmoError> {
        match &self.value {
            Value::Callable(spy) => Ok(spy),
            _ => Err(FirmoError::context_error(format!("{matcher} requires a callable probe value"))),
        }
    }

    fn subject_callable<'a>(&self, matcher: &str, subject: &'a Value) -> Result<&'a crate::mocking::Spy, FirmoError> {
        match subject {
            Value::Callable(spy) => Ok(spy),
            _ => Err(FirmoError::context_error(format!("{matcher} requires a callable subject"))),
        }
    }

    pub fn change(&self, subject: &Value) -> Result<(), FirmoError> {
        let probe = self.probe_callable("change")?;
        let action = self.subject_callable("change", subject)?;
        let before = probe.call(&[])?;
        action.call(&[])?;
        let after = probe.call(&[])?;
        let ok = !value_deep_equal(&before, &after);
        self.resolve(ok, "change", || format!("change from {}, but it did not", render_value(&before)), None)
    }

    pub fn increase(&self, subject: &Value) -> Result<(), FirmoError> {
        let probe = self.probe_callable("increase")?;
        let action = self.subject_callable("increase", subject)?;
        let before = probe.call(&[])?.as_number().unwrap_or(f64::NAN);
        action.call(&[])?;
        let after = probe.call(&[])?.as_number().unwrap_or(f64::NAN);
        let ok = after > before;
        self.resolve(ok, "increase", || format!("increase from {before}, got {after}"), None)
    }

    pub fn decrease(&self, subject: &Value) -> Result<(), FirmoError> {
        let probe = self.probe_callable("decrease")?;
        let action = self.subject_callable("decrease", subject)?;
        let before = probe.call(&[])?.as_number().unwrap_or(f64::NAN);
        action.call(&[])?;
        let after = probe.call(&[])?.as_number().unwrap_or(f64::NAN);
        let ok = after < before;
        self.resolve(ok, "decrease", || format!("decrease from {before}, got {after}"), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_equality_passes_and_fails() {
        assert!(expect(Value::Number(4.0)).to().equal(Value::Number(4.0)).is_ok());
        assert!(expect(Value::Number(4.0)).to().equal(Value::Number(5.0)).is_err());
    }

    #[test]
    fn to_not_negates() {
        assert!(expect(Value::Bool(false)).to_not().be_truthy().is_ok());
        assert!(expect(Value::Bool(true)).to_not().be_truthy().is_err());
    }

    #[test]
    fn double_negation_is_identity() {
        let a = expect(Value::Bool(true)).to_not().to_not().be_truthy();
        let b = expect(Value::Bool(true)).be_truthy();
        assert_eq!(a.is_ok(), b.is_ok());
    }

    #[test]
    fn nil_does_not_exist() {
        assert!(expect(Value::Nil).to().exist().is_err());
    }

    #[test]
    fn have_length_checks_collections() {
        let arr = Value::array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert!(expect(arr).to().have_length(2).is_ok());
    }

    #[test]
    fn be_approximately_uses_epsilon() {
        assert!(expect(Value::Number(1.0001)).to().be_approximately(1.0, 0.01).is_ok());
        assert!(expect(Value::Number(1.1)).to().be_approximately(1.0, 0.01).is_err());
    }

    #[test]
    fn throw_error_matching_invokes_callable() {
        let spy = crate::mocking::Spy::stub();
        spy.raises(FirmoError::execution("boom happened"));
        let v = Value::Callable(spy);
        assert!(expect(v).to().throw_error_matching("boom").is_ok());
    }

    fn counter_probe(count: std::rc::Rc<std::cell::Cell<f64>>) -> Value {
        Value::Callable(crate::mocking::Spy::new(move |_| Ok(Value::Number(count.get()))))
    }

    fn increment_action(count: std::rc::Rc<std::cell::Cell<f64>>) -> Value {
        Value::Callable(crate::mocking::Spy::new(move |_| {
            count.set(count.get() + 1.0);
            Ok(Value::Nil)
        }))
    }

    #[test]
    fn change_passes_when_the_probe_differs_before_and_after() {
        let count = std::rc::Rc::new(std::cell::Cell::new(0.0));
        let probe = counter_probe(count.clone());
        let action = increment_action(count);
        assert!(expect(probe).to().change(&action).is_ok());
    }

    #[test]
    fn change_fails_and_negation_inverts_exactly_once() {
        let count = std::rc::Rc::new(std::cell::Cell::new(0.0));
        let probe = counter_probe(count.clone());
        let noop = Value::Callable(crate::mocking::Spy::new(|_| Ok(Value::Nil)));
        assert!(expect(probe.clone()).to().change(&noop).is_err());
        assert!(expect(probe).to_not().change(&noop).is_ok());
        let _ = count;
    }

    #[test]
    fn increase_and_decrease_compare_the_probed_number() {
        let count = std::rc::Rc::new(std::cell::Cell::new(5.0));
        let probe = counter_probe(count.clone());
        let action = increment_action(count.clone());
        assert!(expect(probe.clone()).to().increase(&action).is_ok());
        assert!(expect(probe).to().decrease(&action).is_err());
    }
}
