//! Spy: a callable value that records every invocation (C5).

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::FirmoError;
use crate::value::Value;

/// One monotonic counter shared by every spy created in the process, so
/// `called_before` can compare call order across unrelated spies.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::SeqCst)
}

/// The outcome of a single recorded call.
#[derive(Clone)]
pub enum CallOutcome {
    Returned(Vec<Value>),
    Raised(FirmoError),
}

/// One recorded invocation of a [`Spy`].
#[derive(Clone)]
pub struct CallRecord {
    pub args: Vec<Value>,
    pub outcome: CallOutcome,
    pub thread_id: std::thread::ThreadId,
    pub sequence_no: u64,
}

struct SpyInner {
    id: u64,
    behavior: RefCell<Behavior>,
    calls: RefCell<Vec<CallRecord>>,
}

enum Behavior {
    Native(Box<dyn Fn(&[Value]) -> Result<Value, FirmoError>>),
    Returns(Value),
    ReturnsInSequence { values: Vec<Value>, next: usize },
    Raises(FirmoError),
}

/// A callable value that records every call. [`Spy::new`] wraps an arbitrary
/// closure; [`Spy::stub`] builds one whose body is supplied declaratively
/// (`returns`, `returns_in_sequence`, `raises`).
#[derive(Clone)]
pub struct Spy {
    inner: Rc<SpyInner>,
}

impl Spy {
    pub fn new(f: impl Fn(&[Value]) -> Result<Value, FirmoError> + 'static) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Spy {
            inner: Rc::new(SpyInner {
                id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
                behavior: RefCell::new(Behavior::Native(Box::new(f))),
                calls: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn stub() -> Self {
        Self::new(|_| Ok(Value::Nil))
    }

    pub fn returns(&self, value: Value) {
        *self.inner.behavior.borrow_mut() = Behavior::Returns(value);
    }

    pub fn returns_in_sequence(&self, values: Vec<Value>) {
        *self.inner.behavior.borrow_mut() = Behavior::ReturnsInSequence { values, next: 0 };
    }

    pub fn raises(&self, error: FirmoError) {
        *self.inner.behavior.borrow_mut() = Behavior::Raises(error);
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Invokes the spy, recording the call regardless of outcome.
    pub fn call(&self, args: &[Value]) -> Result<Value, FirmoError> {
        let result = {
            let mut behavior = self.inner.behavior.borrow_mut();
            match &mut *behavior {
                Behavior::Native(f) => f(args),
                Behavior::Returns(v) => Ok(v.clone()),
                Behavior::ReturnsInSequence { values, next } => {
                    let v = values.get(*next).cloned().unwrap_or(Value::Nil);
                    if *next + 1 < values.len() {
                        *next += 1;
                    }
                    Ok(v)
                }
                Behavior::Raises(e) => Err(e.clone()),
            }
        };
        let outcome = match &result {
            Ok(v) => CallOutcome::Returned(vec![v.clone()]),
            Err(e) => CallOutcome::Raised(e.clone()),
        };
        self.inner.calls.borrow_mut().push(CallRecord {
            args: args.to_vec(),
            outcome,
            thread_id: std::thread::current().id(),
            sequence_no: next_sequence(),
        });
        result
    }

    pub fn called(&self) -> bool {
        !self.inner.calls.borrow().is_empty()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.borrow().len()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.inner.calls.borrow().clone()
    }

    pub fn last_call(&self) -> Option<CallRecord> {
        self.inner.calls.borrow().last().cloned()
    }

    pub fn called_with(&self, args: &[Value]) -> bool {
        self.inner
            .calls
            .borrow()
            .iter()
            .any(|c| c.args.len() == args.len() && c.args.iter().zip(args).all(|(a, b)| crate::value::deep_equal(a, b)))
    }

    /// `true` iff this spy's earliest call happened before `other`'s
    /// earliest call, per the single monotonic sequence counter.
    pub fn called_before(&self, other: &Spy) -> bool {
        let this_min = self.inner.calls.borrow().iter().map(|c| c.sequence_no).min();
        let other_min = other.inner.calls.borrow().iter().map(|c| c.sequence_no).min();
        match (this_min, other_min) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_and_counts() {
        let spy = Spy::new(|args| Ok(args.first().cloned().unwrap_or(Value::Nil)));
        spy.call(&[Value::Number(1.0)]).unwrap();
        spy.call(&[Value::Number(2.0)]).unwrap();
        assert_eq!(spy.call_count(), 2);
        assert!(spy.called());
    }

    #[test]
    fn sequence_numbers_strictly_increase() {
        let spy = Spy::stub();
        spy.call(&[]).unwrap();
        spy.call(&[]).unwrap();
        let calls = spy.calls();
        assert!(calls[0].sequence_no < calls[1].sequence_no);
    }

    #[test]
    fn called_before_compares_minimum_sequence() {
        let a = Spy::stub();
        let b = Spy::stub();
        a.call(&[]).unwrap();
        b.call(&[]).unwrap();
        assert!(a.called_before(&b));
        assert!(!b.called_before(&a));
    }

    #[test]
    fn returns_in_sequence_sticks_on_last_value() {
        let spy = Spy::stub();
        spy.returns_in_sequence(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(spy.call(&[]).unwrap().as_number(), Some(1.0));
        assert_eq!(spy.call(&[]).unwrap().as_number(), Some(2.0));
        assert_eq!(spy.call(&[]).unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn raises_propagates_error() {
        let spy = Spy::stub();
        spy.raises(FirmoError::mock("boom"));
        assert!(spy.call(&[]).is_err());
    }
}
