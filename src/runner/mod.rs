//! Drives the Registry for a set of files, producing a FileResult per file
//! and an aggregate summary (C6).

pub mod context;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use crate::assertion::recorder;
use crate::error::FirmoError;
use crate::mocking;
use crate::model::{FileResult, TestResult, TestStatus};
use crate::registry::{HookBody, Registry, RunFilter, TestBody, TestContext};
use crate::scheduler::{run_async_test, AsyncContext, Clock};

pub use context::{current_file_path, track_mock, track_temp_file, ContextKind};

#[derive(Clone, Default)]
pub struct RunnerConfig {
    pub fail_fast: bool,
}

pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Runner { config }
    }

    /// Runs one file's worth of tests end to end: evaluates `build` to
    /// populate a fresh registry, then drives every runnable test.
    pub fn run_file(
        &self,
        file_path: &Path,
        filter: &RunFilter,
        build: impl FnOnce(&mut Registry) -> Result<(), FirmoError>,
    ) -> FileResult {
        let start = Instant::now();
        let mut registry = Registry::new();
        context::push(ContextKind::File, file_path.to_path_buf());

        if let Err(e) = build(&mut registry) {
            context::pop();
            return FileResult::structural_failure(file_path.to_path_buf(), e, start.elapsed().as_secs_f64());
        }

        let mut results: Vec<TestResult> = Vec::new();
        let mut stop = false;
        registry.walk(filter, &mut |ctx| {
            if stop {
                return;
            }
            let result = self.run_test(file_path, ctx);
            if self.config.fail_fast && result.status == TestStatus::Fail {
                stop = true;
            }
            results.push(result);
        });

        let empty_describes = registry.empty_describes();
        context::pop();
        let mut file_result = FileResult::from_results(file_path.to_path_buf(), results, start.elapsed().as_secs_f64());
        file_result.empty_describes = empty_describes;
        file_result
    }

    fn run_test(&self, file_path: &Path, ctx: TestContext) -> TestResult {
        let path_string = TestResult::path_string(&ctx.path);
        let name = ctx.path.last().cloned().unwrap_or_default();
        let suite_uses_hooks = ctx.suite_uses_hooks;

        if ctx.skipped {
            return TestResult {
                name,
                path: ctx.path,
                path_string,
                status: TestStatus::Skip,
                error_message: None,
                error_value: None,
                reason: ctx.skip_reason,
                execution_time_s: 0.0,
                file_path: file_path.to_path_buf(),
                expect_error_expected: ctx.expect_error,
                tags: ctx.tags.into_iter().collect(),
                matcher_categories: Vec::new(),
                assertion_count: 0,
                mock_leaks: 0,
                suite_uses_hooks,
            };
        }

        if let Some(build_error) = ctx.build_error {
            return TestResult {
                name,
                path: ctx.path,
                path_string,
                status: TestStatus::Fail,
                error_message: Some(build_error.message.clone()),
                error_value: Some(build_error.clone()),
                reason: None,
                execution_time_s: 0.0,
                file_path: file_path.to_path_buf(),
                expect_error_expected: ctx.expect_error,
                tags: ctx.tags.into_iter().collect(),
                matcher_categories: Vec::new(),
                assertion_count: 0,
                mock_leaks: 0,
                suite_uses_hooks,
            };
        }

        let Some(body) = ctx.body else {
            return TestResult {
                name,
                path: ctx.path,
                path_string,
                status: TestStatus::Pending,
                error_message: None,
                error_value: None,
                reason: None,
                execution_time_s: 0.0,
                file_path: file_path.to_path_buf(),
                expect_error_expected: ctx.expect_error,
                tags: ctx.tags.into_iter().collect(),
                matcher_categories: Vec::new(),
                assertion_count: 0,
                mock_leaks: 0,
                suite_uses_hooks,
            };
        };

        context::push(ContextKind::Test, file_path.to_path_buf());
        recorder::begin_recording();
        let start = Instant::now();
        let expect_error = ctx.expect_error;
        let timeout_ms = ctx.timeout_ms;
        let before_each = &ctx.before_each;
        let after_each = &ctx.after_each;

        // A panicking body must still hit teardown below (mock restore,
        // temp file cleanup, context pop) instead of unwinding straight
        // through this frame and corrupting the context stack for whatever
        // test or file runs next.
        let dispatch = catch_unwind(AssertUnwindSafe(|| {
            let before_err = run_hooks(before_each);

            let (mut outcome, elapsed_s) = if before_err.is_some() {
                (before_err, start.elapsed().as_secs_f64())
            } else {
                match body {
                    TestBody::Sync(f) => (f().err(), start.elapsed().as_secs_f64()),
                    TestBody::Async(f) => {
                        let clock = Clock::new();
                        let async_ctx = AsyncContext::new(clock.clone());
                        let future = f(async_ctx);
                        let future = Box::pin(async move {
                            future.await?;
                            Ok(crate::value::Value::Nil)
                        });
                        let result = run_async_test(&clock, future, timeout_ms as u64);
                        (result.err(), clock.now_ms() as f64 / 1000.0)
                    }
                }
            };

            // expect_error semantics: an error is success, its absence is failure.
            if expect_error {
                outcome = match outcome {
                    Some(_) => None,
                    None => Some(FirmoError::execution("expected test to error but it did not")),
                };
            }

            let after_err = run_hooks(after_each);
            if let Some(e) = after_err {
                outcome = Some(match outcome {
                    Some(existing) => existing.with_context("after_each_error", e.message),
                    None => e,
                });
            }

            (outcome, elapsed_s)
        }));

        let (mut outcome, mut elapsed_s) = match dispatch {
            Ok(pair) => pair,
            Err(payload) => (
                Some(FirmoError::execution(format!("test panicked: {}", panic_message(&payload)))),
                start.elapsed().as_secs_f64(),
            ),
        };

        let (mocks, temp_files) = context::drain_current();
        let mock_leaks = mocks.iter().filter(|m| !m.borrow().is_restored()).count();
        let _ = mocking::restore_all_active(&mocks);
        for f in &temp_files {
            let _ = std::fs::remove_file(f);
        }
        context::pop();

        let recorded = recorder::take_recorded();
        let matcher_categories: Vec<String> = recorded
            .categories
            .iter()
            .map(|c| format!("{c:?}"))
            .collect();

        if elapsed_s == 0.0 {
            elapsed_s = start.elapsed().as_secs_f64();
        }

        let status = if outcome.is_some() { TestStatus::Fail } else { TestStatus::Pass };
        let error_message = outcome.as_ref().map(|e| e.message.clone());

        TestResult {
            name,
            path: ctx.path,
            path_string,
            status,
            error_message,
            error_value: outcome,
            reason: None,
            execution_time_s: elapsed_s,
            file_path: file_path.to_path_buf(),
            expect_error_expected: ctx.expect_error,
            tags: ctx.tags.into_iter().collect(),
            matcher_categories,
            assertion_count: recorded.count,
            mock_leaks,
            suite_uses_hooks,
        }
    }
}

fn run_hooks(hooks: &[&HookBody]) -> Option<FirmoError> {
    for hook in hooks {
        let result = match hook {
            HookBody::Sync(f) => f(),
            HookBody::Async(f) => {
                let clock = Clock::new();
                let ctx = AsyncContext::new(clock.clone());
                let future = f(ctx);
                run_async_test(
                    &clock,
                    Box::pin(async move {
                        future.await?;
                        Ok(crate::value::Value::Nil)
                    }),
                    5_000,
                )
                .map(|_| ())
            }
        };
        if let Err(e) = result {
            return Some(e);
        }
    }
    None
}

/// Extracts the `&str`/`String` payload `panic!`/`assert!` normally carry;
/// anything else renders as a fixed placeholder rather than guessing at a
/// `Debug` impl that may not exist.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::registry::{Registry, RunFilter, TestOptions};

    fn run_one(build: impl FnOnce(&mut Registry)) -> FileResult {
        let runner = Runner::new(RunnerConfig::default());
        runner.run_file(Path::new("virtual.fixture"), &RunFilter::default(), |r| {
            build(r);
            Ok(())
        })
    }

    #[test]
    fn a_panicking_test_body_is_contained_as_an_execution_error() {
        let result = run_one(|r| {
            r.it("explodes", TestOptions::default(), || panic!("boom"));
        });
        assert_eq!(result.errors, 1);
        let test = &result.results[0];
        assert_eq!(test.error_value.as_ref().unwrap().category, ErrorCategory::Execution);
        eprintln!("DEBUG error_message = {:?}", test.error_message);
        assert!(test.error_message.as_ref().unwrap().contains("boom"));
    }

    #[test]
    fn a_panic_in_one_test_does_not_corrupt_the_context_stack_for_the_next() {
        let result = run_one(|r| {
            r.it("explodes", TestOptions::default(), || panic!("boom"));
            r.it("runs fine after", TestOptions::default(), || {
                crate::assertion::expect(crate::value::Value::Number(1.0))
                    .to()
                    .equal(crate::value::Value::Number(1.0))
            });
        });
        assert_eq!(result.total, 2);
        assert_eq!(result.errors, 1);
        assert_eq!(result.passes, 1);
        let second = result.results.iter().find(|t| t.name == "runs fine after").unwrap();
        assert_eq!(second.status, TestStatus::Pass);
    }
}
