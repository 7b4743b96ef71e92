//! The resolution engine
//!
//! Every transformation on a [`LazyBox`](crate::LazyBox) is built from
//! [`resolve`]: given a raw value and three continuations, it either
//!
//! - runs the success or bad-value continuation immediately,
//! - registers them on a pending value and returns a new pending value, or
//! - hands a [`Fault`] to the error continuation.
//!
//! Panics raised by continuations or by bad-value predicates are caught here
//! and routed to the error continuation, so a pipeline never unwinds through
//! its caller.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::Configuration;
use crate::fault::Fault;
use crate::value::Value;

/// The three-way classification of a settled value.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// A usable value.
    Success(Value),
    /// A value matched by a bad-value rule.
    Bad(Value),
    /// An error.
    Error(Fault),
}

impl Resolved {
    /// Returns `true` for [`Resolved::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Resolved::Success(_))
    }

    /// Returns `true` for [`Resolved::Bad`].
    pub fn is_bad(&self) -> bool {
        matches!(self, Resolved::Bad(_))
    }

    /// Returns `true` for [`Resolved::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Resolved::Error(_))
    }

    /// Turn the classification back into a value.
    pub fn into_value(self) -> Value {
        match self {
            Resolved::Success(v) | Resolved::Bad(v) => v,
            Resolved::Error(fault) => Value::Error(fault),
        }
    }
}

/// Run `f`, turning a panic into a [`Fault`].
pub(crate) fn guard<F>(f: F) -> Result<Value, Fault>
where
    F: FnOnce() -> Value,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(Fault::panicked)
}

/// Dispatch `raw` to one of three continuations.
///
/// Synchronous values are classified against `config` and dispatched
/// immediately. A pending value is left to settle: the continuations are
/// registered on it and a new pending value is returned in its place.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lazybox::{resolve, Configuration, Value};
///
/// let config = Arc::new(Configuration::default());
/// let doubled = resolve(
///     Value::Int(21),
///     &config,
///     |v| Value::from(v.as_i64().map(|n| n * 2)),
///     Value::Error,
///     |bad| bad,
/// );
/// assert_eq!(doubled, Value::Int(42));
///
/// let skipped = resolve(Value::Null, &config, |_| Value::from("called"), Value::Error, |bad| bad);
/// assert_eq!(skipped, Value::Null);
/// ```
pub fn resolve<S, E, B>(
    raw: Value,
    config: &Arc<Configuration>,
    on_success: S,
    on_error: E,
    on_bad: B,
) -> Value
where
    S: FnOnce(Value) -> Value + Send + 'static,
    E: FnOnce(Fault) -> Value + Send + 'static,
    B: FnOnce(Value) -> Value + Send + 'static,
{
    match raw {
        Value::Pending(pending) => {
            crate::trace_event!(trace, "resolution suspended on pending value");
            let config = Arc::clone(config);
            Value::Pending(
                pending.then(move |settled| dispatch(settled, &config, on_success, on_error, on_bad)),
            )
        }
        value => dispatch(value, config, on_success, on_error, on_bad),
    }
}

fn dispatch<S, E, B>(
    value: Value,
    config: &Configuration,
    on_success: S,
    on_error: E,
    on_bad: B,
) -> Value
where
    S: FnOnce(Value) -> Value,
    E: FnOnce(Fault) -> Value,
    B: FnOnce(Value) -> Value,
{
    let classified = match panic::catch_unwind(AssertUnwindSafe(|| config.classify(value))) {
        Ok(classified) => classified,
        Err(payload) => return fail(Fault::panicked(payload), on_error),
    };

    let attempt = match classified {
        Resolved::Success(v) => guard(move || on_success(v)),
        Resolved::Bad(v) => {
            crate::trace_event!(trace, kind = v.kind(), "bad value short-circuited");
            guard(move || on_bad(v))
        }
        Resolved::Error(fault) => {
            crate::trace_event!(trace, error = %fault.message(), "error short-circuited");
            return fail(fault, on_error);
        }
    };

    match attempt {
        Ok(v) => v,
        Err(fault) => fail(fault, on_error),
    }
}

fn fail<E>(fault: Fault, on_error: E) -> Value
where
    E: FnOnce(Fault) -> Value,
{
    guard(move || on_error(fault)).unwrap_or_else(Value::Error)
}

/// Take the value of a nested box, one level deep.
pub(crate) fn unwrap_one_level(value: Value) -> Value {
    match value {
        Value::Boxed(inner) => inner.run(),
        other => other,
    }
}

/// Follow nested boxes and pending results until a plain value appears.
///
/// Gives up with a depth-exceeded fault after `limit` levels, which also
/// bounds self-referential chains.
pub(crate) fn unwrap_deep(value: Value, limit: usize) -> Value {
    unwrap_from(value, limit, 0)
}

fn unwrap_from(mut current: Value, limit: usize, mut depth: usize) -> Value {
    loop {
        if matches!(current, Value::Boxed(_) | Value::Pending(_)) {
            depth += 1;
            if depth > limit {
                return Value::Error(Fault::depth_exceeded(limit));
            }
        }

        match current {
            Value::Boxed(inner) => current = inner.run(),
            Value::Pending(pending) => {
                return Value::Pending(pending.then(move |settled| unwrap_from(settled, limit, depth)))
            }
            other => return other,
        }
    }
}

/// The pass-through continuation used for error branches.
pub(crate) fn keep_error(fault: Fault) -> Value {
    Value::Error(fault)
}

/// The pass-through continuation used for success and bad-value branches.
pub(crate) fn keep(value: Value) -> Value {
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rule;
    use crate::fault::FaultKind;
    use crate::lazy::LazyBox;
    use crate::pending::Pending;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn config() -> Arc<Configuration> {
        Arc::new(Configuration::default())
    }

    fn increment(v: Value) -> Value {
        Value::from(v.as_i64().map(|n| n + 1))
    }

    #[test]
    fn test_success_runs_on_success() {
        assert_eq!(resolve(Value::Int(1), &config(), increment, keep_error, keep), Value::Int(2));
    }

    #[test]
    fn test_bad_value_skips_on_success() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let result = resolve(
            Value::Undefined,
            &config(),
            move |v| {
                flag.store(true, Ordering::SeqCst);
                v
            },
            keep_error,
            |_| Value::from("bad"),
        );

        assert_eq!(result, Value::from("bad"));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_error_goes_to_on_error() {
        let result = resolve(
            Value::error("broken"),
            &config(),
            increment,
            |fault| Value::from(fault.message().to_string()),
            keep,
        );
        assert_eq!(result, Value::from("broken"));
    }

    #[test]
    fn test_panicking_callback_becomes_error() {
        let result = resolve(
            Value::Int(1),
            &config(),
            |_| panic!("callback exploded"),
            keep_error,
            keep,
        );

        match result {
            Value::Error(fault) => {
                assert_eq!(fault.kind(), FaultKind::Panicked);
                assert_eq!(fault.message(), "callback exploded");
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_panicking_predicate_becomes_error() {
        let config = Arc::new(Configuration::new(vec![Rule::predicate(|_: &Value| {
            panic!("predicate exploded")
        })]));

        let result = resolve(Value::Int(1), &config, increment, keep_error, keep);
        assert!(result.is_error());
    }

    #[test]
    fn test_panicking_error_handler_is_contained() {
        let result = resolve(
            Value::error("first"),
            &config(),
            increment,
            |_| panic!("handler exploded"),
            keep,
        );
        assert_eq!(
            result.as_fault().map(Fault::message),
            Some("handler exploded")
        );
    }

    #[tokio::test]
    async fn test_pending_defers_dispatch() {
        let raw = Value::Pending(Pending::resolved(41));
        let result = resolve(raw, &config(), increment, keep_error, keep);

        assert!(result.is_pending());
        assert_eq!(result.settle().await, Value::Int(42));
    }

    #[tokio::test]
    async fn test_rejected_pending_goes_to_on_error() {
        let raw = Value::Pending(Pending::rejected(Fault::new("rejected")));
        let result = resolve(
            raw,
            &config(),
            increment,
            |fault| Value::from(format!("caught {}", fault.message())),
            keep,
        );
        assert_eq!(result.settle().await, Value::from("caught rejected"));
    }

    #[tokio::test]
    async fn test_pending_bad_value_goes_to_on_bad() {
        let raw = Value::Pending(Pending::resolved(f64::NAN));
        let result = resolve(raw, &config(), increment, keep_error, |_| Value::from("nan"));
        assert_eq!(result.settle().await, Value::from("nan"));
    }

    #[test]
    fn test_unwrap_one_level_stops_after_one_box() {
        let inner = LazyBox::of(5);
        let outer = LazyBox::of(inner.clone());
        assert_eq!(unwrap_one_level(Value::Boxed(outer)), Value::Boxed(inner));
        assert_eq!(unwrap_one_level(Value::Int(5)), Value::Int(5));
    }

    #[test]
    fn test_unwrap_deep_follows_nested_boxes() {
        let nested = LazyBox::of(LazyBox::of(LazyBox::of("core")));
        assert_eq!(unwrap_deep(Value::Boxed(nested), 8), Value::from("core"));
    }

    #[test]
    fn test_unwrap_deep_is_bounded() {
        let mut value = Value::Int(0);
        for _ in 0..5 {
            value = Value::Boxed(LazyBox::of(value));
        }

        let result = unwrap_deep(value, 3);
        assert_eq!(
            result.as_fault().map(Fault::kind),
            Some(FaultKind::DepthExceeded)
        );
    }

    #[tokio::test]
    async fn test_unwrap_deep_through_pending() {
        let value = Value::pending(async { LazyBox::of(LazyBox::of(9)) });
        assert_eq!(unwrap_deep(value, 8).settle().await, Value::Int(9));
    }
}
