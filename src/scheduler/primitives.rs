//! The three suspension primitives: `await`, `wait_until`, `parallel_async`.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::FirmoError;
use crate::value::Value;

use super::{Clock, TaskOutcome};

thread_local! {
    /// Deadlines reported by pending futures during the current poll round.
    /// The executor drains this after every `Pending` result to decide how
    /// far to advance virtual time.
    static PENDING_DEADLINES: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

pub(super) fn report_deadline(ms: u64) {
    PENDING_DEADLINES.with(|p| p.borrow_mut().push(ms));
}

pub(super) fn take_deadlines() -> Vec<u64> {
    PENDING_DEADLINES.with(|p| std::mem::take(&mut *p.borrow_mut()))
}

/// The handle an async test body uses to reach scheduler primitives. Holds
/// the shared virtual clock; has no other state because all suspension
/// bookkeeping lives in the futures themselves.
#[derive(Clone)]
pub struct AsyncContext {
    clock: Clock,
}

impl AsyncContext {
    pub fn new(clock: Clock) -> Self {
        AsyncContext { clock }
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

/// `await(ms)`: suspends until virtual time >= now + ms. `await(0)` still
/// yields once, per the boundary-behavior requirement, because the first
/// poll always reports Pending before the second poll observes the
/// (already-reached) deadline.
pub fn await_ms(ctx: &AsyncContext, ms: u64) -> Sleep {
    Sleep {
        clock: ctx.clock.clone(),
        deadline: ctx.clock.now_ms() + ms,
        polled_once: false,
    }
}

pub struct Sleep {
    clock: Clock,
    deadline: u64,
    polled_once: bool,
}

impl Future for Sleep {
    type Output = ();
    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.polled_once && self.clock.now_ms() >= self.deadline {
            Poll::Ready(())
        } else {
            self.polled_once = true;
            report_deadline(self.deadline);
            Poll::Pending
        }
    }
}

/// `wait_until(pred, timeout_ms, interval_ms)`: evaluates `pred` immediately,
/// then retries every `interval_ms` of virtual time until it returns true or
/// `timeout_ms` of virtual time elapse.
pub fn wait_until<F>(ctx: &AsyncContext, pred: F, timeout_ms: u64, interval_ms: u64) -> WaitUntil<F>
where
    F: FnMut() -> Result<bool, FirmoError>,
{
    WaitUntil {
        clock: ctx.clock.clone(),
        started: ctx.clock.now_ms(),
        next_check: ctx.clock.now_ms(),
        timeout_ms,
        interval_ms: interval_ms.max(1),
        pred,
        checked_once: false,
    }
}

pub struct WaitUntil<F> {
    clock: Clock,
    started: u64,
    next_check: u64,
    timeout_ms: u64,
    interval_ms: u64,
    pred: F,
    checked_once: bool,
}

impl<F> Unpin for WaitUntil<F> {}

impl<F> Future for WaitUntil<F>
where
    F: FnMut() -> Result<bool, FirmoError>,
{
    type Output = Result<(), FirmoError>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), FirmoError>> {
        let now = self.clock.now_ms();
        if !self.checked_once || now >= self.next_check {
            self.checked_once = true;
            match (self.pred)() {
                Ok(true) => return Poll::Ready(Ok(())),
                Ok(false) => {}
                Err(e) => return Poll::Ready(Err(FirmoError::assertion(e.message))),
            }
            if now.saturating_sub(self.started) >= self.timeout_ms {
                return Poll::Ready(Err(FirmoError::timeout(format!(
                    "wait_until timed out after {}ms",
                    self.timeout_ms
                ))));
            }
            let interval = self.interval_ms;
            self.next_check = now + interval;
        }
        report_deadline(self.next_check);
        Poll::Pending
    }
}

/// `parallel_async(tasks)`: spawns each task as a child future, suspends
/// until all complete, and returns results in input order. A failing task
/// does not cancel its siblings (no cancellation by default, per §4.3).
pub fn parallel_async(
    tasks: Vec<Pin<Box<dyn Future<Output = Result<Value, FirmoError>>>>>,
) -> ParallelAsync {
    let len = tasks.len();
    ParallelAsync {
        tasks: tasks.into_iter().map(Some).collect(),
        results: (0..len).map(|_| None).collect(),
    }
}

pub struct ParallelAsync {
    tasks: Vec<Option<Pin<Box<dyn Future<Output = Result<Value, FirmoError>>>>>>,
    results: Vec<Option<TaskOutcome>>,
}

impl Future for ParallelAsync {
    type Output = Result<Vec<TaskOutcome>, FirmoError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let mut all_done = true;
        for i in 0..this.tasks.len() {
            if this.tasks[i].is_none() {
                continue;
            }
            match this.tasks[i].as_mut().unwrap().as_mut().poll(cx) {
                Poll::Ready(Ok(v)) => {
                    this.results[i] = Some(TaskOutcome::Completed(v));
                    this.tasks[i] = None;
                }
                Poll::Ready(Err(e)) => {
                    this.results[i] = Some(TaskOutcome::Failed(e));
                    this.tasks[i] = None;
                }
                Poll::Pending => all_done = false,
            }
        }
        if all_done {
            let outcomes: Vec<TaskOutcome> = this
                .results
                .iter()
                .map(|o| o.clone().unwrap_or(TaskOutcome::TimedOut))
                .collect();
            let any_failed = outcomes.iter().any(|o| matches!(o, TaskOutcome::Failed(_)));
            if any_failed {
                let first = outcomes
                    .iter()
                    .find_map(|o| match o {
                        TaskOutcome::Failed(e) => Some(e.message.clone()),
                        _ => None,
                    })
                    .unwrap_or_default();
                Poll::Ready(Err(FirmoError::execution(format!(
                    "parallel_async: a child task failed: {first}"
                ))
                .with_context("child_count", outcomes.len().to_string())))
            } else {
                Poll::Ready(Ok(outcomes))
            }
        } else {
            Poll::Pending
        }
    }
}
