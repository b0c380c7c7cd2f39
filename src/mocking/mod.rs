//! Spy, stub, and mock-of-table model with call-record verification (C5).

mod spy;
mod table_mock;

pub use spy::{CallOutcome, CallRecord, Spy};
pub use table_mock::{ArgMatcher, Expectation, ExpectationFailure, Mock};

use std::cell::RefCell;

use crate::error::FirmoError;
use crate::value::Value;

/// A handle the current [`crate::runner::RunContext`] keeps so teardown can
/// restore every mock created during a test, even on failure.
pub type MockHandle = std::rc::Rc<RefCell<Mock>>;

/// Runs `restore()` on every handle, recording any that were already
/// restored as a framework-internal inconsistency rather than panicking.
pub fn restore_all_active(mocks: &[MockHandle]) -> Result<(), FirmoError> {
    for m in mocks {
        m.borrow_mut().restore();
    }
    Ok(())
}

/// Convenience: build a `Value::Callable` spy directly from a Rust closure.
pub fn spy_value(f: impl Fn(&[Value]) -> Result<Value, FirmoError> + 'static) -> Value {
    Value::Callable(Spy::new(f))
}
