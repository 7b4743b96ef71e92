//! Terminal runners: the only places a box's producer chain is forced.

use std::sync::Arc;

use super::LazyBox;
use crate::config::Configuration;
use crate::fault::Fault;
use crate::resolve::{guard, Resolved};
use crate::value::Value;

impl LazyBox {
    /// Evaluate the chain.
    ///
    /// Returns the value, which may be pending. A panic during evaluation is
    /// returned as an error value, never propagated.
    pub fn run(&self) -> Value {
        self.evaluate()
    }

    /// Evaluate the chain, failing fast on an error value.
    ///
    /// Pending values are returned as-is; an error they settle to is the
    /// caller's to handle.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{Fault, LazyBox, Value};
    ///
    /// assert_eq!(LazyBox::of(1).unwrap(), Ok(Value::Int(1)));
    /// assert_eq!(LazyBox::of(Value::Null).unwrap(), Ok(Value::Null));
    /// assert_eq!(LazyBox::of(Value::error("bad")).unwrap(), Err(Fault::new("bad")));
    /// ```
    pub fn unwrap(&self) -> Result<Value, Fault> {
        match self.evaluate() {
            Value::Error(fault) => Err(fault),
            value => Ok(value),
        }
    }

    /// Evaluate the chain and wait until the value is no longer pending.
    pub async fn settle(&self) -> Value {
        self.evaluate().settle().await
    }

    /// Evaluate the chain and match on its classification.
    ///
    /// Exactly one of the three callbacks runs, once. For a pending value
    /// the match happens when it settles and the result is pending too.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let describe = |b: LazyBox| {
    ///     b.fold(
    ///         |fault| format!("error: {}", fault.message()),
    ///         |bad| format!("bad: {}", bad.kind()),
    ///         |ok| format!("ok: {:?}", ok),
    ///     )
    /// };
    ///
    /// assert_eq!(describe(LazyBox::of(1)), Value::from("ok: Int(1)"));
    /// assert_eq!(describe(LazyBox::of(Value::Null)), Value::from("bad: null"));
    /// assert_eq!(describe(LazyBox::of(Value::error("x"))), Value::from("error: x"));
    /// ```
    pub fn fold<E, B, S, R>(&self, on_error: E, on_bad: B, on_success: S) -> Value
    where
        E: FnOnce(Fault) -> R + Send + 'static,
        B: FnOnce(Value) -> R + Send + 'static,
        S: FnOnce(Value) -> R + Send + 'static,
        R: Into<Value>,
    {
        self.fold_with_finally(on_error, on_bad, on_success, || {})
    }

    /// [`fold`](LazyBox::fold), then run `on_finally` exactly once after
    /// whichever branch ran, whether the value was pending or not. A branch
    /// that returns a pending value is waited on before `on_finally` runs.
    ///
    /// A panicking callback yields an error value without running a second
    /// branch.
    pub fn fold_with_finally<E, B, S, Fin, R>(
        &self,
        on_error: E,
        on_bad: B,
        on_success: S,
        on_finally: Fin,
    ) -> Value
    where
        E: FnOnce(Fault) -> R + Send + 'static,
        B: FnOnce(Value) -> R + Send + 'static,
        S: FnOnce(Value) -> R + Send + 'static,
        Fin: FnOnce() + Send + 'static,
        R: Into<Value>,
    {
        let config = Arc::clone(&self.configuration);
        match self.evaluate() {
            Value::Pending(pending) => Value::Pending(pending.then(move |settled| {
                fold_settled(settled, &config, on_error, on_bad, on_success, on_finally)
            })),
            value => fold_settled(value, &config, on_error, on_bad, on_success, on_finally),
        }
    }

    /// Evaluate now and return a box holding the result as a constant.
    ///
    /// Later stages built on the returned box never re-run the stages before
    /// it. A pending result is shared, so it settles once.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    /// use lazybox::{LazyBox, Value};
    ///
    /// let calls = Arc::new(AtomicUsize::new(0));
    /// let counter = Arc::clone(&calls);
    /// let expensive = LazyBox::from_producer(move || {
    ///     counter.fetch_add(1, Ordering::SeqCst);
    ///     10
    /// });
    ///
    /// let collected = expensive.collect();
    /// assert_eq!(collected.map(|v| v.as_i64().map(|n| n + 1)).run(), Value::Int(11));
    /// assert_eq!(collected.run(), Value::Int(10));
    /// assert_eq!(calls.load(Ordering::SeqCst), 1);
    /// ```
    pub fn collect(&self) -> LazyBox {
        LazyBox::constant(self.evaluate(), Arc::clone(&self.configuration))
    }
}

fn fold_settled<E, B, S, Fin, R>(
    value: Value,
    config: &Configuration,
    on_error: E,
    on_bad: B,
    on_success: S,
    on_finally: Fin,
) -> Value
where
    E: FnOnce(Fault) -> R,
    B: FnOnce(Value) -> R,
    S: FnOnce(Value) -> R,
    Fin: FnOnce() + Send + 'static,
    R: Into<Value>,
{
    let outcome = guard(move || match config.classify(value) {
        Resolved::Success(v) => on_success(v).into(),
        Resolved::Bad(v) => on_bad(v).into(),
        Resolved::Error(fault) => on_error(fault).into(),
    })
    .unwrap_or_else(Value::Error);

    match outcome {
        Value::Pending(pending) => {
            Value::Pending(pending.then(move |settled| finish(settled, on_finally)))
        }
        settled => finish(settled, on_finally),
    }
}

fn finish<Fin>(outcome: Value, on_finally: Fin) -> Value
where
    Fin: FnOnce(),
{
    match guard(move || {
        on_finally();
        Value::Undefined
    }) {
        Ok(_) => outcome,
        Err(fault) => Value::Error(fault),
    }
}
