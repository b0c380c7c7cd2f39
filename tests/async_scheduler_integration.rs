//! Seed scenarios 3 and 4 (async timing, parallel async order), driven
//! through the public `Runner`/`Registry` API directly rather than a
//! host embedding, since the engine's own virtual scheduler is under test.

use firmo::assertion::expect;
use firmo::error::ErrorCategory;
use firmo::registry::{Registry, RunFilter, TestOptions};
use firmo::runner::{Runner, RunnerConfig};
use firmo::scheduler::{await_ms, parallel_async, wait_until, TaskOutcome};
use firmo::value::Value;
use std::path::Path;
use std::pin::Pin;
use std::future::Future;

type BoxFuture = Pin<Box<dyn Future<Output = Result<(), firmo::error::FirmoError>>>>;

fn run_one(build: impl FnOnce(&mut Registry) + 'static) -> firmo::model::FileResult {
    let runner = Runner::new(RunnerConfig::default());
    runner.run_file(Path::new("virtual.fixture"), &RunFilter::default(), |r| {
        build(r);
        Ok(())
    })
}

/// Seed scenario 3: `await(50)` passes within a 200ms budget; `await(300)`
/// times out, and virtual time never decreases across the run.
#[test]
fn await_within_timeout_passes_beyond_it_times_out() {
    let result = run_one(|r| {
        r.it_async(
            "tick",
            TestOptions { timeout_ms: Some(200), ..Default::default() },
            |ctx| -> BoxFuture {
                Box::pin(async move {
                    await_ms(&ctx, 50).await;
                    expect(Value::Number(ctx.clock_ms() as f64)).to().be_greater_than(40.0)
                })
            },
        );
        r.it_async(
            "too slow",
            TestOptions { timeout_ms: Some(200), ..Default::default() },
            |ctx| -> BoxFuture {
                Box::pin(async move {
                    await_ms(&ctx, 300).await;
                    Ok(())
                })
            },
        );
    });

    assert_eq!(result.passes, 1);
    assert_eq!(result.errors, 1);
    let failed = result.results.iter().find(|t| t.name == "too slow").unwrap();
    assert_eq!(failed.error_value.as_ref().unwrap().category, ErrorCategory::Timeout);
}

/// Seed scenario 4: `parallel_async` returns results in input order even
/// though the second task's shorter `await` resolves first.
#[test]
fn parallel_async_preserves_input_order() {
    let result = run_one(|r| {
        r.it_async("fan out", TestOptions::default(), |ctx| -> BoxFuture {
            Box::pin(async move {
                let a = {
                    let ctx = ctx.clone();
                    Box::pin(async move {
                        await_ms(&ctx, 70).await;
                        Ok(Value::str("a"))
                    }) as std::pin::Pin<Box<dyn std::future::Future<Output = Result<Value, firmo::error::FirmoError>>>>
                };
                let b = {
                    let ctx = ctx.clone();
                    Box::pin(async move {
                        await_ms(&ctx, 50).await;
                        Ok(Value::str("b"))
                    }) as std::pin::Pin<Box<dyn std::future::Future<Output = Result<Value, firmo::error::FirmoError>>>>
                };
                let outcomes = parallel_async(vec![a, b]).await?;
                let values: Vec<&str> = outcomes
                    .iter()
                    .map(|o| match o {
                        TaskOutcome::Completed(v) => v.as_str().unwrap(),
                        _ => panic!("expected both tasks to complete"),
                    })
                    .collect();
                expect(Value::Bool(values == vec!["a", "b"])).to().be_truthy()
            })
        });
    });

    assert_eq!(result.passes, 1);
    assert_eq!(result.errors, 0);
}

/// `wait_until(pred, 0)` (boundary behavior): evaluates `pred` once and
/// either passes immediately or times out without a second check.
#[test]
fn wait_until_zero_timeout_checks_predicate_exactly_once() {
    let result = run_one(|r| {
        r.it_async("immediate", TestOptions::default(), |ctx| -> BoxFuture {
            Box::pin(async move { wait_until(&ctx, || Ok(true), 0, 10).await })
        });
        r.it_async("never true", TestOptions::default(), |ctx| -> BoxFuture {
            Box::pin(async move { wait_until(&ctx, || Ok(false), 0, 10).await })
        });
    });

    assert_eq!(result.passes, 1);
    assert_eq!(result.errors, 1);
    let failed = result.results.iter().find(|t| t.name == "never true").unwrap();
    assert_eq!(failed.error_value.as_ref().unwrap().category, ErrorCategory::Timeout);
}
