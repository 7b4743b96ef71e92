//! Testing utilities for lazy pipelines
//!
//! Assertion macros that classify a [`Value`](crate::Value) the way a box
//! would, a call counter for checking laziness, and property-based testing
//! support behind the `proptest` feature.
//!
//! # Examples
//!
//! ## Assertion Macros
//!
//! ```rust
//! use lazybox::{assert_bad, assert_error, assert_success, LazyBox, Value};
//!
//! assert_success!(LazyBox::of(42).run());
//! assert_success!(LazyBox::of(41).map(|v| v.as_i64().map(|n| n + 1)).run(), Value::Int(42));
//! assert_bad!(LazyBox::of(Value::Null).run());
//! assert_error!(LazyBox::of(Value::error("boom")).run(), "boom");
//! ```
//!
//! ## Call Counter
//!
//! ```rust
//! use lazybox::testing::CallCounter;
//! use lazybox::LazyBox;
//!
//! let counter = CallCounter::new();
//! let tick = counter.clone();
//! let lazy = LazyBox::of(1).map(move |v| {
//!     tick.tick();
//!     v
//! });
//!
//! assert_eq!(counter.count(), 0);
//! lazy.run();
//! lazy.run();
//! assert_eq!(counter.count(), 2);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A shared counter for recording how often a callback runs.
///
/// Clones share the same count, so one clone can move into a closure while
/// the test keeps another.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicUsize>,
}

impl CallCounter {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call.
    pub fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// The number of calls recorded so far.
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Assert that a value classifies as a success under the default
/// configuration.
///
/// With a second argument, also assert the value equals it.
///
/// # Example
///
/// ```rust
/// use lazybox::{assert_success, Value};
///
/// assert_success!(Value::Int(1));
/// assert_success!(Value::from("a"), Value::from("a"));
/// ```
#[macro_export]
macro_rules! assert_success {
    ($value:expr) => {
        match $crate::default_configuration().classify($crate::Value::from($value)) {
            $crate::Resolved::Success(_) => {}
            other => {
                panic!("Expected Success, got {:?}", other);
            }
        }
    };
    ($value:expr, $expected:expr) => {
        match $crate::default_configuration().classify($crate::Value::from($value)) {
            $crate::Resolved::Success(v) => {
                assert_eq!(v, $crate::Value::from($expected));
            }
            other => {
                panic!("Expected Success {:?}, got {:?}", $expected, other);
            }
        }
    };
}

/// Assert that a value classifies as bad under the default configuration.
///
/// # Example
///
/// ```rust
/// use lazybox::{assert_bad, Value};
///
/// assert_bad!(Value::Null);
/// assert_bad!(Value::Float(f64::NAN));
/// ```
#[macro_export]
macro_rules! assert_bad {
    ($value:expr) => {
        match $crate::default_configuration().classify($crate::Value::from($value)) {
            $crate::Resolved::Bad(_) => {}
            other => {
                panic!("Expected Bad, got {:?}", other);
            }
        }
    };
}

/// Assert that a value is an error.
///
/// With a second argument, also assert the error's message equals it.
///
/// # Example
///
/// ```rust
/// use lazybox::{assert_error, Value};
///
/// assert_error!(Value::error("boom"));
/// assert_error!(Value::error("boom"), "boom");
/// ```
#[macro_export]
macro_rules! assert_error {
    ($value:expr) => {
        match $crate::Value::from($value) {
            $crate::Value::Error(_) => {}
            other => {
                panic!("Expected Error, got {:?}", other);
            }
        }
    };
    ($value:expr, $message:expr) => {
        match $crate::Value::from($value) {
            $crate::Value::Error(fault) => {
                assert_eq!(fault.message(), $message);
            }
            other => {
                panic!("Expected Error {:?}, got {:?}", $message, other);
            }
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
use crate::value::Value;

#[cfg(feature = "proptest")]
fn scalar_value() -> BoxedStrategy<Value> {
    prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(Value::Str),
    ]
    .boxed()
}

/// Plain data values: scalars and nested collections. Callables, boxes,
/// pending values and errors are never generated.
#[cfg(feature = "proptest")]
impl Arbitrary for Value {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        scalar_value()
            .prop_recursive(3, 24, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::set),
                    prop::collection::vec(("[a-z]{1,4}", inner), 0..4).prop_map(Value::record),
                ]
            })
            .boxed()
    }
}
