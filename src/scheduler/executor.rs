//! Drives a single async test body to completion against virtual time.

use std::future::Future;
use std::pin::Pin;
use std::task::Context;

use crate::error::FirmoError;
use crate::value::Value;

use super::noop_waker::noop_waker;
use super::primitives::take_deadlines;
use super::Clock;

/// Result of running one async test: either its own outcome, or a timeout
/// once virtual time exceeds the test's budget (regardless of whether it
/// was suspended in `await` or `wait_until`).
pub type ParallelOutcome = Result<Vec<super::TaskOutcome>, FirmoError>;

/// Polls `future` repeatedly, advancing `clock` to the nearest reported
/// deadline whenever it returns `Pending`, until it completes or virtual
/// time exceeds `timeout_ms`.
pub fn run_async_test(
    clock: &Clock,
    mut future: Pin<Box<dyn Future<Output = Result<Value, FirmoError>>>>,
    timeout_ms: u64,
) -> Result<Value, FirmoError> {
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    loop {
        match future.as_mut().poll(&mut cx) {
            std::task::Poll::Ready(result) => return result,
            std::task::Poll::Pending => {
                let deadlines = take_deadlines();
                let Some(next) = deadlines.into_iter().min() else {
                    return Err(FirmoError::internal(
                        "async task suspended without registering a wake deadline",
                    ));
                };
                clock.advance_to(next);
                if clock.now_ms() > timeout_ms {
                    return Err(FirmoError::timeout(format!(
                        "test exceeded its {timeout_ms}ms timeout"
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{await_ms, AsyncContext};

    #[test]
    fn await_advances_virtual_time_without_wall_delay() {
        let clock = Clock::new();
        let ctx = AsyncContext::new(clock.clone());
        let fut: Pin<Box<dyn Future<Output = Result<Value, FirmoError>>>> = Box::pin(async move {
            await_ms(&ctx, 50).await;
            Ok(Value::Number(ctx.clock_ms() as f64))
        });
        let start = std::time::Instant::now();
        let result = run_async_test(&clock, fut, 200).unwrap();
        assert!(start.elapsed().as_millis() < 50);
        assert_eq!(result.as_number(), Some(50.0));
    }

    #[test]
    fn exceeding_timeout_fails_with_timeout_category() {
        let clock = Clock::new();
        let ctx = AsyncContext::new(clock.clone());
        let fut: Pin<Box<dyn Future<Output = Result<Value, FirmoError>>>> = Box::pin(async move {
            await_ms(&ctx, 300).await;
            Ok(Value::Nil)
        });
        let err = run_async_test(&clock, fut, 200).unwrap_err();
        assert_eq!(err.category, crate::error::ErrorCategory::Timeout);
    }
}
