//! Tests for LazyBox construction, combinators and runners.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::{ConfigurationPatch, Rule};
use crate::fault::{Fault, FaultKind};
use crate::lazy::{is_box, LazyBox};
use crate::pending::Pending;
use crate::value::Value;

fn plus_one(v: Value) -> Option<i64> {
    v.as_i64().map(|n| n + 1)
}

fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (Arc::clone(&calls), calls)
}

// Construction and laziness
#[test]
fn test_of_returns_value() {
    assert_eq!(LazyBox::of("hello").run(), Value::from("hello"));
}

#[test]
fn test_nothing_runs_until_a_runner() {
    let (calls, seen) = counter();
    let chain = LazyBox::from_producer(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        1
    })
    .map(plus_one)
    .map(plus_one);

    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(chain.run(), Value::Int(3));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_each_run_reruns_the_chain() {
    let (calls, seen) = counter();
    let chain = LazyBox::from_producer(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        1
    })
    .map(plus_one);

    chain.run();
    chain.run();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn test_panicking_producer_runs_to_error() {
    let chain = LazyBox::from_producer(|| -> i64 { panic!("producer exploded") }).map(plus_one);
    let fault = chain.unwrap().unwrap_err();
    assert_eq!(fault.kind(), FaultKind::Panicked);
    assert_eq!(fault.message(), "producer exploded");
}

#[test]
fn test_is_box() {
    assert!(is_box(&Value::Boxed(LazyBox::of(1))));
    assert!(!is_box(&Value::Int(1)));
}

// map
#[test]
fn test_map_skips_bad_values() {
    let (calls, seen) = counter();
    for bad in [Value::Null, Value::Undefined, Value::Float(f64::NAN)] {
        let calls = Arc::clone(&calls);
        let result = LazyBox::of(bad.clone())
            .map(move |v| {
                calls.fetch_add(1, Ordering::SeqCst);
                v
            })
            .run();

        if bad.is_nan() {
            assert!(result.is_nan());
        } else {
            assert_eq!(result, bad);
        }
    }
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}

#[test]
fn test_map_err_result_becomes_error_value() {
    let parsed = LazyBox::of("forty-two").map(|v| v.as_str().unwrap_or_default().parse::<i64>());
    assert!(parsed.run().is_error());

    let parsed = LazyBox::of("42").map(|v| v.as_str().unwrap_or_default().parse::<i64>());
    assert_eq!(parsed.run(), Value::Int(42));
}

#[test]
fn test_error_skips_later_stages_and_reaches_unwrap() {
    let chain = LazyBox::of(1)
        .map(|_| Err::<i64, _>("step two failed"))
        .map(plus_one)
        .filter(|_| true);

    assert_eq!(chain.unwrap(), Err(Fault::new("step two failed")));
}

#[test]
fn test_panicking_callback_becomes_error_for_next_stage() {
    let chain = LazyBox::of(1).map(|_| -> i64 { panic!("mapper exploded") });
    let recovered = chain.catch(|fault| format!("recovered from {}", fault.message()));
    assert_eq!(recovered.run(), Value::from("recovered from mapper exploded"));
}

// filter
#[test]
fn test_filter_uses_truthiness() {
    assert_eq!(LazyBox::of(5).filter(|_| 1).run(), Value::Int(5));
    assert_eq!(LazyBox::of(5).filter(|_| 0).run(), Value::Null);
    assert_eq!(LazyBox::of(5).filter(|_| "").run(), Value::Null);
}

#[test]
fn test_filter_predicate_nan_is_falsy_not_bad() {
    assert_eq!(LazyBox::of(5).filter(|_| f64::NAN).run(), Value::Null);
}

#[test]
fn test_filter_predicate_error_propagates() {
    let result = LazyBox::of(5).filter(|_| Err::<bool, _>("cannot decide")).run();
    assert_eq!(result, Value::Error(Fault::new("cannot decide")));
}

#[tokio::test]
async fn test_filter_with_pending_predicate() {
    let kept = LazyBox::of(8).filter(|v| {
        let n = v.as_i64().unwrap_or_default();
        Value::pending(async move { n > 5 })
    });
    assert_eq!(kept.settle().await, Value::Int(8));

    let dropped = LazyBox::of(2).filter(|v| {
        let n = v.as_i64().unwrap_or_default();
        Value::pending(async move { n > 5 })
    });
    assert_eq!(dropped.settle().await, Value::Null);
}

// flat_map and flat
#[test]
fn test_flat_map_unwraps_exactly_one_level() {
    let inner = LazyBox::of(3);
    let nested = LazyBox::of(1).flat_map({
        let inner = inner.clone();
        move |_| LazyBox::of(inner.clone())
    });
    assert_eq!(nested.run(), Value::Boxed(inner));
}

#[test]
fn test_flat_map_passes_plain_results_through() {
    assert_eq!(LazyBox::of(1).flat_map(plus_one).run(), Value::Int(2));
}

#[test]
fn test_flat_map_skips_bad_values() {
    let result = LazyBox::of(Value::Null).flat_map(|_| LazyBox::of("unreachable"));
    assert_eq!(result.run(), Value::Null);
}

#[test]
fn test_flat_is_a_no_op_on_plain_values() {
    assert_eq!(LazyBox::of("x").flat().run(), Value::from("x"));
    assert_eq!(LazyBox::of(LazyBox::of("x")).flat().run(), Value::from("x"));
}

#[tokio::test]
async fn test_flat_map_with_async_box() {
    let result = LazyBox::of(2).flat_map(|v| {
        let n = v.as_i64().unwrap_or_default();
        LazyBox::from_future(async move { n * 21 })
    });
    assert_eq!(result.settle().await, Value::Int(42));
}

// ap
#[test]
fn test_ap_applies_function() {
    let add_one = LazyBox::of(Value::function(plus_one));
    assert_eq!(add_one.ap(&LazyBox::of(2)).run(), Value::Int(3));
}

#[test]
fn test_ap_non_function_passes_through() {
    assert_eq!(LazyBox::of(7).ap(&LazyBox::of(2)).run(), Value::Int(7));
}

#[test]
fn test_ap_bad_function_side_short_circuits() {
    let (calls, seen) = counter();
    let arg = LazyBox::from_producer(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        2
    });
    assert_eq!(LazyBox::of(Value::Null).ap(&arg).run(), Value::Null);
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ap_with_both_sides_pending() {
    let func = LazyBox::from_future(async { Value::function(plus_one) });
    let arg = LazyBox::from_future(async { 41 });
    assert_eq!(func.ap(&arg).settle().await, Value::Int(42));
}

#[tokio::test]
async fn test_ap_with_pending_bad_argument() {
    let func = LazyBox::of(Value::function(|_: Value| "called"));
    let arg = LazyBox::from_future(async { Value::Undefined });
    assert_eq!(func.ap(&arg).settle().await, Value::Undefined);
}

// mutate
#[test]
fn test_mutate_sees_bad_and_error_values() {
    let on_null = LazyBox::of(Value::Null).mutate(|raw| raw.is_null());
    assert_eq!(on_null.run(), Value::Bool(true));

    let on_error = LazyBox::of(Value::error("e")).mutate(|raw| raw.is_error());
    assert_eq!(on_error.run(), Value::Bool(true));
}

#[test]
fn test_mutate_sees_pending_values_unresolved() {
    let seen = LazyBox::from_future(async { 1 }).mutate(|raw| raw.kind());
    assert_eq!(seen.run(), Value::from("pending"));
}

#[test]
fn test_mutate_contains_panics() {
    let result = LazyBox::of(1).mutate(|_| -> i64 { panic!("mutation exploded") }).run();
    assert_eq!(result.as_fault().map(Fault::kind), Some(FaultKind::Panicked));
}

// recover, catch, map_err, context
#[test]
fn test_recover_handles_bad_and_error_values() {
    let recovered = LazyBox::of(Value::Null).recover(|bad| format!("was {}", bad.kind()));
    assert_eq!(recovered.run(), Value::from("was null"));

    let recovered = LazyBox::of(Value::error("e")).recover(|bad| format!("was {}", bad.kind()));
    assert_eq!(recovered.run(), Value::from("was error"));
}

#[test]
fn test_catch_is_narrower_than_recover() {
    let (calls, seen) = counter();
    let result = LazyBox::of(Value::Null)
        .catch(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            "caught"
        })
        .run();

    assert_eq!(result, Value::Null);
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_catch_handles_rejection() {
    let caught = LazyBox::of(Pending::rejected(Fault::new("offline")))
        .catch(|fault| format!("fallback after {}", fault.message()));
    assert_eq!(caught.settle().await, Value::from("fallback after offline"));
}

#[tokio::test]
async fn test_catch_handles_pending_that_resolves_to_error() {
    let caught = LazyBox::from_future(async { Err::<i64, _>("late failure") })
        .map(plus_one)
        .catch(|_| 0);
    assert_eq!(caught.settle().await, Value::Int(0));
}

#[test]
fn test_map_err_and_context() {
    let fault = LazyBox::of(Value::error("low level"))
        .map_err(|fault| Fault::new(format!("wrapped: {}", fault.message())))
        .context("loading settings")
        .unwrap()
        .unwrap_err();

    assert_eq!(fault.message(), "wrapped: low level");
    assert_eq!(fault.context_trail(), &["loading settings"]);
}

#[test]
fn test_context_leaves_successes_alone() {
    assert_eq!(LazyBox::of(1).context("unused").run(), Value::Int(1));
}

#[test]
fn test_tap_observes_without_changing() {
    let (calls, seen) = counter();
    let result = LazyBox::of(5)
        .tap(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .run();

    assert_eq!(result, Value::Int(5));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

// traverse, sequence, distribute
#[test]
fn test_traverse_preserves_shapes() {
    assert_eq!(
        LazyBox::of(Value::list([1, 2, 3])).traverse(plus_one).run(),
        Value::list([2, 3, 4])
    );
    assert_eq!(
        LazyBox::of(Value::record([("a", 1), ("b", 2)])).traverse(plus_one).run(),
        Value::record([("a", 2), ("b", 3)])
    );
    assert_eq!(
        LazyBox::of(Value::set([1, 2])).traverse(plus_one).run(),
        Value::set([2, 3])
    );
    assert_eq!(
        LazyBox::of(Value::map([("k", 1)])).traverse(plus_one).run(),
        Value::map([("k", 2)])
    );
}

#[test]
fn test_traverse_on_bad_container_skips() {
    assert_eq!(LazyBox::of(Value::Null).traverse(plus_one).run(), Value::Null);
}

#[test]
fn test_sequence_collects_box_values() {
    let boxes = Value::record([("x", LazyBox::of(1)), ("y", LazyBox::of(LazyBox::of(2)))]);
    assert_eq!(
        LazyBox::of(boxes).sequence().run(),
        Value::record([("x", 1), ("y", 2)])
    );
}

#[tokio::test]
async fn test_sequence_with_async_boxes() {
    let boxes = Value::list([
        LazyBox::from_future(async { "a" }),
        LazyBox::of("b"),
    ]);
    assert_eq!(
        LazyBox::of(boxes).sequence().settle().await,
        Value::list(["a", "b"])
    );
}

#[test]
fn test_distribute_then_sequence_round_trips() {
    for original in [
        Value::list([1, 2, 3]),
        Value::set(["a", "b"]),
        Value::map([(1, "one"), (2, "two")]),
        Value::record([("k", 1)]),
        Value::Int(5),
    ] {
        let round_trip = LazyBox::of(original.clone()).distribute().sequence().run();
        assert_eq!(round_trip, original);
    }
}

#[test]
fn test_distribute_wraps_each_element() {
    match LazyBox::of(Value::list([1, 2])).distribute().run() {
        Value::List(items) => assert!(items.iter().all(Value::is_box)),
        other => panic!("expected list, got {:?}", other),
    }
}

// Runners
#[test]
fn test_unwrap_returns_bad_values_unchanged() {
    assert_eq!(LazyBox::of(Value::Undefined).unwrap(), Ok(Value::Undefined));
}

#[test]
fn test_unwrap_does_not_wait_on_pending() {
    let value = LazyBox::from_future(async { Err::<i64, _>("later") }).unwrap();
    assert!(matches!(value, Ok(Value::Pending(_))));
}

#[test]
fn test_fold_with_finally_sync() {
    let (calls, seen) = counter();
    let result = LazyBox::of(1).fold_with_finally(
        |_| "error",
        |_| "bad",
        |_| "success",
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
        },
    );

    assert_eq!(result, Value::from("success"));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fold_with_finally_pending_runs_after_settlement() {
    let (calls, seen) = counter();
    let result = LazyBox::from_future(async { Value::Null }).fold_with_finally(
        |_| "error",
        |_| "bad",
        |_| "success",
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
        },
    );

    assert!(result.is_pending());
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(result.settle().await, Value::from("bad"));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fold_with_finally_waits_for_pending_branch() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (branch_log, finally_log) = (Arc::clone(&order), Arc::clone(&order));

    let result = LazyBox::of(1).fold_with_finally(
        |_| Value::from("error"),
        |_| Value::from("bad"),
        move |_| {
            let branch_log = Arc::clone(&branch_log);
            Value::pending(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                branch_log.lock().push("branch settled");
                "done"
            })
        },
        move || finally_log.lock().push("finally"),
    );

    assert!(result.is_pending());
    assert!(order.lock().is_empty());
    assert_eq!(result.settle().await, Value::from("done"));
    assert_eq!(*order.lock(), ["branch settled", "finally"]);
}

#[test]
fn test_fold_panicking_branch_does_not_run_another() {
    let (calls, seen) = counter();
    let errors = Arc::clone(&calls);
    let result = LazyBox::of(1).fold_with_finally(
        move |_| {
            errors.fetch_add(100, Ordering::SeqCst);
            "error"
        },
        |_| "bad",
        |_| -> &'static str { panic!("success branch exploded") },
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
        },
    );

    assert!(result.is_error());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_collect_memoizes() {
    let (calls, seen) = counter();
    let collected = LazyBox::from_producer(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        1
    })
    .collect();

    collected.map(plus_one).run();
    collected.map(plus_one).run();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_collect_keeps_errors() {
    let collected = LazyBox::of(1).map(|_| Err::<i64, _>("once")).collect();
    assert_eq!(collected.unwrap(), Err(Fault::new("once")));
}

#[tokio::test]
async fn test_collect_shares_pending_settlement() {
    let (calls, seen) = counter();
    let collected = LazyBox::from_async(move || {
        let calls = Arc::clone(&calls);
        async move { calls.fetch_add(1, Ordering::SeqCst) as i64 }
    })
    .collect();

    assert_eq!(collected.settle().await, Value::Int(0));
    assert_eq!(collected.settle().await, Value::Int(0));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

// Configuration scopes
#[test]
fn test_with_configuration_changes_bad_values() {
    let strict = LazyBox::of(1).with_configuration(vec![Rule::literal(1)]);
    assert_eq!(strict.map(plus_one).run(), Value::Int(1));

    let lenient = LazyBox::of(Value::Null).with_configuration(Vec::<Rule>::new());
    assert_eq!(lenient.map(|v| v.is_null()).run(), Value::Bool(true));
}

#[test]
fn test_configuration_is_inherited_by_derived_boxes() {
    let chain = LazyBox::of(0)
        .with_configuration(vec![Rule::literal(2)])
        .map(plus_one)
        .map(plus_one)
        .map(plus_one);

    assert_eq!(chain.run(), Value::Int(2));
    assert_eq!(chain.configuration().bad_values().len(), 1);
}

#[test]
fn test_override_does_not_leak_into_siblings() {
    let base = LazyBox::of(1);
    let sibling = base.map(plus_one);
    let overridden = base.with_configuration(vec![Rule::literal(1)]).map(plus_one);

    assert_eq!(sibling.run(), Value::Int(2));
    assert_eq!(overridden.run(), Value::Int(1));
    assert_eq!(base.configuration().bad_values().len(), 3);
}

#[test]
fn test_restore_default_configuration_on_a_chain() {
    let restored = LazyBox::of(1)
        .with_configuration(vec![Rule::literal(1)])
        .restore_default_configuration()
        .map(plus_one);
    assert_eq!(restored.run(), Value::Int(2));
}

#[test]
fn test_unwrap_depth_follows_configuration() {
    let deep = LazyBox::of(LazyBox::of(LazyBox::of(LazyBox::of(1))));
    let shallow = LazyBox::of(Value::list([deep.clone()]))
        .with_configuration(ConfigurationPatch::new().max_unwrap_depth(2))
        .sequence();

    match shallow.run() {
        Value::List(items) => assert_eq!(
            items[0].as_fault().map(Fault::kind),
            Some(FaultKind::DepthExceeded)
        ),
        other => panic!("expected list, got {:?}", other),
    }

    assert_eq!(LazyBox::of(Value::list([deep])).sequence().run(), Value::list([1]));
}

#[test]
fn test_of_with_applies_patch() {
    let strict = LazyBox::of_with("", vec![Rule::literal("")]);
    assert_eq!(strict.map(|_| "filled").run(), Value::from(""));

    let strict = LazyBox::from_producer_with(|| "", vec![Rule::literal("")]);
    assert_eq!(strict.map(|_| "filled").run(), Value::from(""));
}
