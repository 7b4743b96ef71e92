//! The lazy box
//!
//! A [`LazyBox`] holds a zero-argument producer and a [`Configuration`].
//! Nothing is evaluated when a box is built or transformed: every combinator
//! returns a new box whose producer closes over the previous one, and only a
//! terminal runner ([`run`](LazyBox::run), [`unwrap`](LazyBox::unwrap),
//! [`fold`](LazyBox::fold), [`collect`](LazyBox::collect)) forces the chain.
//!
//! Running a box twice runs its producer chain twice; use
//! [`collect`](LazyBox::collect) to evaluate once and reuse the result.
//!
//! # Example
//!
//! ```
//! use lazybox::{LazyBox, Value};
//!
//! let total = LazyBox::of(vec![1, 2, 3])
//!     .traverse(|v| v.as_i64().map(|n| n * 2))
//!     .map(|list| match list {
//!         Value::List(items) => items.iter().filter_map(Value::as_i64).sum::<i64>(),
//!         _ => 0,
//!     });
//!
//! assert_eq!(total.run(), Value::Int(12));
//! ```

mod combinators;
mod runners;

#[cfg(test)]
mod tests;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::{default_configuration, Configuration, ConfigurationPatch};
use crate::pending::Pending;
use crate::resolve::guard;
use crate::value::Value;

type Producer = Arc<dyn Fn() -> Value + Send + Sync>;

/// A lazy, async-transparent container.
///
/// Boxes are immutable and cheap to clone; clones share the producer.
#[derive(Clone)]
pub struct LazyBox {
    producer: Producer,
    configuration: Arc<Configuration>,
}

impl LazyBox {
    /// Wrap a plain value, using the current default configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// assert_eq!(LazyBox::of(42).run(), Value::Int(42));
    /// ```
    pub fn of(value: impl Into<Value>) -> Self {
        LazyBox::constant(value.into(), default_configuration())
    }

    /// Wrap a plain value with `patch` laid over the default configuration.
    pub fn of_with(value: impl Into<Value>, patch: impl Into<ConfigurationPatch>) -> Self {
        let config = default_configuration().apply(&patch.into());
        LazyBox::constant(value.into(), Arc::new(config))
    }

    /// Wrap a producer. It is called every time the box is run.
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
    /// let lazy = LazyBox::from_producer(move || counter.fetch_add(1, Ordering::SeqCst) as i64);
    ///
    /// assert_eq!(calls.load(Ordering::SeqCst), 0);
    /// assert_eq!(lazy.run(), Value::Int(0));
    /// assert_eq!(lazy.run(), Value::Int(1));
    /// ```
    pub fn from_producer<F, R>(producer: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        LazyBox::from_parts(
            Arc::new(move || producer().into()),
            default_configuration(),
        )
    }

    /// Wrap a producer with `patch` laid over the default configuration.
    pub fn from_producer_with<F, R>(producer: F, patch: impl Into<ConfigurationPatch>) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        LazyBox::from_producer(producer).with_configuration(patch)
    }

    /// Wrap a single future. It is awaited at most once; every run shares
    /// its settlement.
    pub fn from_future<F, T>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Into<Value> + 'static,
    {
        LazyBox::of(Pending::from_future(future))
    }

    /// Wrap an async producer. Each run starts a fresh future.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// # tokio_test::block_on(async {
    /// let fetched = LazyBox::from_async(|| async { 20 }).map(|v| v.as_i64().map(|n| n + 1));
    /// assert_eq!(fetched.settle().await, Value::Int(21));
    /// # });
    /// ```
    pub fn from_async<F, Fut, T>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Into<Value> + 'static,
    {
        LazyBox::from_producer(move || Pending::from_future(producer()))
    }

    pub(crate) fn constant(value: Value, configuration: Arc<Configuration>) -> Self {
        LazyBox::from_parts(Arc::new(move || value.clone()), configuration)
    }

    pub(crate) fn from_parts(producer: Producer, configuration: Arc<Configuration>) -> Self {
        LazyBox {
            producer,
            configuration,
        }
    }

    /// The configuration this box resolves with.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[cfg(feature = "tracing")]
    pub(crate) fn shared_configuration(&self) -> Arc<Configuration> {
        Arc::clone(&self.configuration)
    }

    /// A box with the same producer and `patch` laid over this box's
    /// configuration. Boxes derived from the result inherit it; boxes
    /// derived from `self` do not.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Rule, Value};
    ///
    /// let base = LazyBox::of(1);
    /// let strict = base.with_configuration(vec![Rule::literal(1)]);
    ///
    /// assert_eq!(strict.map(|_| "mapped").run(), Value::Int(1));
    /// assert_eq!(base.map(|_| "mapped").run(), Value::from("mapped"));
    /// ```
    pub fn with_configuration(&self, patch: impl Into<ConfigurationPatch>) -> Self {
        let config = self.configuration.apply(&patch.into());
        LazyBox::from_parts(Arc::clone(&self.producer), Arc::new(config))
    }

    /// A box with the same producer and the current process-wide default
    /// configuration.
    pub fn restore_default_configuration(&self) -> Self {
        LazyBox::from_parts(Arc::clone(&self.producer), default_configuration())
    }

    /// Returns `true` if both boxes share the same producer.
    pub fn ptr_eq(&self, other: &LazyBox) -> bool {
        Arc::ptr_eq(&self.producer, &other.producer)
    }

    /// Call the producer, turning a panic into an error value.
    pub(crate) fn evaluate(&self) -> Value {
        guard(|| (self.producer)()).unwrap_or_else(Value::Error)
    }

    /// Build the next stage: `step` receives this box's raw value each time
    /// the new box runs.
    pub(crate) fn derive<F>(&self, step: F) -> LazyBox
    where
        F: Fn(Value, &Arc<Configuration>) -> Value + Send + Sync + 'static,
    {
        let source = self.clone();
        let config = Arc::clone(&self.configuration);
        LazyBox::from_parts(
            Arc::new(move || step(source.evaluate(), &config)),
            Arc::clone(&self.configuration),
        )
    }
}

impl fmt::Debug for LazyBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyBox")
            .field("producer", &"<function>")
            .field("configuration", &self.configuration)
            .finish()
    }
}

/// Returns `true` if `value` is a [`LazyBox`].
pub fn is_box(value: &Value) -> bool {
    value.is_box()
}
