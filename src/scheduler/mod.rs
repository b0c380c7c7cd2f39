//! Cooperative async scheduler with a virtual clock (C4).
//!
//! Async test bodies are ordinary `Future`s; suspension points (`await`,
//! `wait_until`, `parallel_async`) are futures that report a wake deadline
//! instead of registering a real `Waker`. The executor below drives a
//! future to completion by polling it, and whenever it sees `Pending`,
//! advances a virtual clock to the nearest reported deadline rather than
//! actually sleeping — this is what makes a 200ms-timeout test resolve in
//! microseconds of wall time.

mod executor;
mod noop_waker;
mod primitives;

pub use executor::{run_async_test, ParallelOutcome};
pub use primitives::{await_ms, parallel_async, wait_until, AsyncContext};

use std::cell::Cell;
use std::rc::Rc;

/// Shared virtual clock. `Rc<Cell<u64>>` rather than `Arc<AtomicU64>`
/// because the whole scheduler is single-threaded by design (§5).
#[derive(Clone)]
pub struct Clock(Rc<Cell<u64>>);

impl Clock {
    pub fn new() -> Self {
        Clock(Rc::new(Cell::new(0)))
    }

    pub fn now_ms(&self) -> u64 {
        self.0.get()
    }

    pub fn advance_to(&self, ms: u64) {
        if ms > self.0.get() {
            self.0.set(ms);
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// The terminal state of one task in a `parallel_async` batch.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Completed(crate::value::Value),
    Failed(crate::error::FirmoError),
    TimedOut,
}
