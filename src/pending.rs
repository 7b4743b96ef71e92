//! Pending asynchronous results
//!
//! A [`Pending`] is the asynchronous half of a pipeline: a shared, clonable
//! future that settles to a [`Value`]. Settling to [`Value::Error`] is the
//! rejection case. A pending that settles to another pending is flattened,
//! and a panic while polling the wrapped future settles as an error instead
//! of unwinding through the caller.
//!
//! Pending results are ordinary Rust futures: they make progress when
//! awaited. Clones share one underlying computation, so continuations
//! registered with [`Pending::then`] run once no matter how many clones are
//! awaited.
//!
//! # Example
//!
//! ```
//! use lazybox::{Pending, Value};
//!
//! # tokio_test::block_on(async {
//! let pending = Pending::from_future(async { 20 }).then(|v| Value::from(v.as_i64().map(|n| n + 1)));
//! assert_eq!(pending.await, Value::Int(21));
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::fault::Fault;
use crate::value::Value;

/// A clonable asynchronous result that settles to a [`Value`].
#[derive(Clone)]
pub struct Pending {
    inner: Shared<BoxFuture<'static, Value>>,
}

impl Pending {
    /// Wrap a future producing a [`Value`].
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Value> + Send + 'static,
    {
        let settled = async move {
            let mut current = AssertUnwindSafe(future)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Value::Error(Fault::panicked(payload)));

            while let Value::Pending(next) = current {
                current = next.await;
            }

            current
        };

        Pending {
            inner: settled.boxed().shared(),
        }
    }

    /// Wrap a future producing anything convertible into a [`Value`].
    ///
    /// A future yielding `Result<T, E>` rejects with its `Err`.
    pub fn from_future<F, T>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Into<Value> + 'static,
    {
        Pending::new(future.map(Into::into))
    }

    /// A pending result that is already fulfilled.
    pub fn resolved(value: impl Into<Value>) -> Self {
        let value = value.into();
        Pending::new(async move { value })
    }

    /// A pending result that is already rejected.
    pub fn rejected(fault: Fault) -> Self {
        Pending::new(async move { Value::Error(fault) })
    }

    /// Register a continuation that receives the settled value.
    ///
    /// The continuation runs on every settlement, rejected or not. If it
    /// returns another pending value, the result is flattened.
    pub fn then<F>(self, f: F) -> Pending
    where
        F: FnOnce(Value) -> Value + Send + 'static,
    {
        Pending::new(async move {
            let settled = self.await;
            f(settled)
        })
    }

    /// The settled value, if this pending result has already been driven to
    /// completion by some clone.
    pub fn peek(&self) -> Option<&Value> {
        self.inner.peek()
    }

    /// Returns `true` if both handles share the same computation.
    pub fn ptr_eq(&self, other: &Pending) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl Future for Pending {
    type Output = Value;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Value> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            Some(settled) => f.debug_tuple("Pending").field(settled).finish(),
            None => f.write_str("Pending(<unsettled>)"),
        }
    }
}
