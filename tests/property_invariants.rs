//! Universal properties and boundary behavior from the test-tree, value,
//! and scheduler contracts, checked over randomly generated inputs rather
//! than single hand-picked examples.

use firmo::assertion::expect;
use firmo::registry::{Registry, RunFilter, TestOptions};
use firmo::runner::{Runner, RunnerConfig};
use firmo::scheduler::{await_ms, parallel_async, TaskOutcome};
use firmo::value::{deep_equal, Value};
use proptest::prelude::*;
use std::cell::RefCell;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::rc::Rc;

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Pass,
    Fail,
    Skip,
}

fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop_oneof![Just(Outcome::Pass), Just(Outcome::Fail), Just(Outcome::Skip)]
}

fn run_outcomes(outcomes: Vec<Outcome>) -> firmo::model::FileResult {
    let runner = Runner::new(RunnerConfig::default());
    runner.run_file(Path::new("virtual.fixture"), &RunFilter::default(), |r: &mut Registry| {
        for (i, o) in outcomes.iter().enumerate() {
            let name = format!("t{i}");
            match o {
                Outcome::Pass => r.it(&name, TestOptions::default(), || expect(Value::Number(1.0)).to().equal(Value::Number(1.0))),
                Outcome::Fail => r.it(&name, TestOptions::default(), || expect(Value::Number(1.0)).to().equal(Value::Number(2.0))),
                Outcome::Skip => r.xit(&name, None, TestOptions::default()),
            }
        }
        Ok(())
    })
}

proptest! {
    /// For any runnable test tree, passes + errors + skipped always equals
    /// the number of registered leaves.
    #[test]
    fn passes_errors_skipped_always_sum_to_total(outcomes in prop::collection::vec(outcome_strategy(), 0..30)) {
        let n = outcomes.len();
        let result = run_outcomes(outcomes);
        prop_assert_eq!(result.total, n);
        prop_assert_eq!(result.passes + result.errors + result.skipped, result.total);
    }
}

fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        (-1000i32..1000).prop_map(|n| Value::Number(n as f64)),
        "[a-z]{0,8}".prop_map(Value::str),
    ]
}

fn value_tree() -> impl Strategy<Value = Value> {
    let leaf = scalar_value();
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::array),
            prop::collection::vec(("[a-z]{1,5}", inner), 0..4).prop_map(|pairs| {
                Value::table(pairs.into_iter().map(|(k, v)| (k, v)).collect())
            }),
        ]
    })
}

proptest! {
    /// `deep_equal` is reflexive for any value tree.
    #[test]
    fn deep_equal_is_reflexive(v in value_tree()) {
        prop_assert!(deep_equal(&v, &v));
    }

    /// `deep_equal` is symmetric: swapping operands never changes the verdict.
    #[test]
    fn deep_equal_is_symmetric(a in value_tree(), b in value_tree()) {
        prop_assert_eq!(deep_equal(&a, &b), deep_equal(&b, &a));
    }
}

/// A self-referential table (`t.self = t`) must not send `deep_equal` into
/// an infinite loop; the identity-pair cycle guard makes it terminate and
/// report equal to itself.
#[test]
fn deep_equal_terminates_on_a_self_referential_table() {
    let table = Value::table(vec![("n".into(), Value::Number(1.0))]);
    if let Value::Table(inner) = &table {
        inner.borrow_mut().push(("self".to_string(), table.clone()));
    }
    assert!(deep_equal(&table, &table));
}

/// Two independently-built cyclic arrays that are structurally identical
/// aside from the self-reference must still compare equal.
#[test]
fn deep_equal_terminates_on_mutually_referential_arrays() {
    let a = Value::array(vec![Value::Number(1.0)]);
    if let Value::Array(inner) = &a {
        inner.borrow_mut().push(a.clone());
    }
    let b = Value::array(vec![Value::Number(1.0)]);
    if let Value::Array(inner) = &b {
        inner.borrow_mut().push(b.clone());
    }
    assert!(deep_equal(&a, &b));
}

type ValueFuture = Pin<Box<dyn Future<Output = Result<Value, firmo::error::FirmoError>>>>;

fn delayed(ctx: firmo::scheduler::AsyncContext, ms: u64, tag: &'static str) -> ValueFuture {
    Box::pin(async move {
        await_ms(&ctx, ms).await;
        Ok(Value::str(tag))
    })
}

proptest! {
    /// `parallel_async` always returns outcomes in input order, regardless
    /// of how the delays are shuffled relative to each other.
    #[test]
    fn parallel_async_is_order_preserving_for_any_delay_permutation(delays in prop::collection::vec(1u64..500, 2..6)) {
        let tags: Vec<&'static str> = vec!["a", "b", "c", "d", "e", "f"];
        let runner = Runner::new(RunnerConfig::default());
        let results = Rc::new(RefCell::new(None));
        let captured = results.clone();
        let delays_for_test = delays.clone();

        runner.run_file(Path::new("virtual.fixture"), &RunFilter::default(), move |r: &mut Registry| {
            let delays = delays_for_test.clone();
            let tags = tags.clone();
            r.it_async("fan out", TestOptions::default(), move |ctx| -> Pin<Box<dyn Future<Output = Result<(), firmo::error::FirmoError>>>> {
                let delays = delays.clone();
                let tags = tags.clone();
                let captured = captured.clone();
                Box::pin(async move {
                    let futures: Vec<ValueFuture> = delays
                        .iter()
                        .zip(tags.iter())
                        .map(|(ms, tag)| delayed(ctx.clone(), *ms, tag))
                        .collect();
                    let outcomes = parallel_async(futures).await?;
                    let names: Vec<String> = outcomes
                        .iter()
                        .map(|o| match o {
                            TaskOutcome::Completed(v) => v.as_str().unwrap().to_string(),
                            other => format!("{other:?}"),
                        })
                        .collect();
                    *captured.borrow_mut() = Some(names);
                    Ok(())
                })
            });
            Ok(())
        });

        let expected: Vec<String> = (0..delays.len()).map(|i| ["a", "b", "c", "d", "e", "f"][i].to_string()).collect();
        prop_assert_eq!(results.borrow().clone().unwrap(), expected);
    }
}
