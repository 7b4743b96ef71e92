//! Transformations on a [`LazyBox`].
//!
//! Each combinator is a thin stage over [`resolve`]: it picks what to do on
//! success, on a bad value and on an error, and leaves the sync/async and
//! short-circuit decisions to the engine.

use std::sync::Arc;

use super::LazyBox;
use crate::fault::Fault;
use crate::resolve::{guard, keep, keep_error, resolve, unwrap_one_level};
use crate::traverse::{distribute_value, traverse_value};
use crate::value::Value;

impl LazyBox {
    /// Transform a usable value. Bad values and errors skip `f`.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// assert_eq!(LazyBox::of(2).map(|v| v.as_i64().map(|n| n * 10)).run(), Value::Int(20));
    /// assert_eq!(LazyBox::of(Value::Null).map(|_| "never").run(), Value::Null);
    /// ```
    pub fn map<F, R>(&self, f: F) -> LazyBox
    where
        F: Fn(Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let f = Arc::new(f);
        self.derive(move |raw, config| {
            let f = Arc::clone(&f);
            resolve(raw, config, move |v| f(v).into(), keep_error, keep)
        })
    }

    /// Keep a usable value only when `predicate` holds; otherwise the value
    /// becomes `Null`.
    ///
    /// The predicate's result is judged by truthiness and may itself be
    /// pending. An error result propagates as an error.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let even = |v: &Value| v.as_i64().is_some_and(|n| n % 2 == 0);
    /// assert_eq!(LazyBox::of(4).filter(even).run(), Value::Int(4));
    /// assert_eq!(LazyBox::of(3).filter(even).run(), Value::Null);
    /// ```
    pub fn filter<P, R>(&self, predicate: P) -> LazyBox
    where
        P: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let predicate = Arc::new(predicate);
        self.derive(move |raw, config| {
            let predicate = Arc::clone(&predicate);
            resolve(
                raw,
                config,
                move |v| {
                    let verdict = predicate(&v).into();
                    keep_if(v, verdict)
                },
                keep_error,
                keep,
            )
        })
    }

    /// Transform a usable value with a function that may return another box.
    /// A returned box is unwrapped exactly one level.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let halved = LazyBox::of(10).flat_map(|v| LazyBox::of(v.as_i64().map(|n| n / 2)));
    /// assert_eq!(halved.run(), Value::Int(5));
    /// ```
    pub fn flat_map<F, R>(&self, f: F) -> LazyBox
    where
        F: Fn(Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let f = Arc::new(f);
        self.derive(move |raw, config| {
            let f = Arc::clone(&f);
            let inner_config = Arc::clone(config);
            resolve(
                raw,
                config,
                move |v| resolve(f(v).into(), &inner_config, unwrap_one_level, keep_error, keep),
                keep_error,
                keep,
            )
        })
    }

    /// Unwrap one level if the value is itself a box.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// assert_eq!(LazyBox::of(LazyBox::of(1)).flat().run(), Value::Int(1));
    /// assert_eq!(LazyBox::of(1).flat().run(), Value::Int(1));
    /// ```
    pub fn flat(&self) -> LazyBox {
        self.derive(|raw, config| resolve(raw, config, unwrap_one_level, keep_error, keep))
    }

    /// Apply this box's function to `other`'s value.
    ///
    /// A value that is not a [`Value::Function`] passes through unchanged. A
    /// bad value or error on either side short-circuits without calling the
    /// function. Either side may be pending.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let inc = LazyBox::of(Value::function(|v: Value| v.as_i64().map(|n| n + 1)));
    /// assert_eq!(inc.ap(&LazyBox::of(2)).run(), Value::Int(3));
    /// assert_eq!(inc.ap(&LazyBox::of(Value::Null)).run(), Value::Null);
    /// ```
    pub fn ap(&self, other: &LazyBox) -> LazyBox {
        let other = other.clone();
        self.derive(move |raw, config| {
            let other = other.clone();
            let inner_config = Arc::clone(config);
            resolve(
                raw,
                config,
                move |applied| match applied {
                    Value::Function(func) => resolve(
                        other.evaluate(),
                        &inner_config,
                        move |arg| func.call(arg),
                        keep_error,
                        keep,
                    ),
                    not_callable => not_callable,
                },
                keep_error,
                keep,
            )
        })
    }

    /// Apply `f` to the raw value, whatever it is: bad, an error, or pending.
    ///
    /// A panic in `f` still becomes an error value.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let seen = LazyBox::of(Value::Null).mutate(|raw| raw.kind());
    /// assert_eq!(seen.run(), Value::from("null"));
    /// ```
    pub fn mutate<F, R>(&self, f: F) -> LazyBox
    where
        F: Fn(Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let f = Arc::new(f);
        self.derive(move |raw, _| {
            let f = Arc::clone(&f);
            guard(move || f(raw).into()).unwrap_or_else(Value::Error)
        })
    }

    /// Replace a bad value or an error. Errors arrive as [`Value::Error`].
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let fallback = |_: Value| 0;
    /// assert_eq!(LazyBox::of(Value::Null).recover(fallback).run(), Value::Int(0));
    /// assert_eq!(LazyBox::of(Value::error("x")).recover(fallback).run(), Value::Int(0));
    /// assert_eq!(LazyBox::of(5).recover(fallback).run(), Value::Int(5));
    /// ```
    pub fn recover<F, R>(&self, f: F) -> LazyBox
    where
        F: Fn(Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let f = Arc::new(f);
        self.derive(move |raw, config| {
            let on_error = Arc::clone(&f);
            let on_bad = Arc::clone(&f);
            resolve(
                raw,
                config,
                keep,
                move |fault| on_error(Value::Error(fault)).into(),
                move |bad| on_bad(bad).into(),
            )
        })
    }

    /// Replace an error. Bad values pass through untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let handled = LazyBox::of(Value::error("boom")).catch(|fault| format!("handled {}", fault.message()));
    /// assert_eq!(handled.run(), Value::from("handled boom"));
    ///
    /// let untouched = LazyBox::of(Value::Null).catch(|_| "handled");
    /// assert_eq!(untouched.run(), Value::Null);
    /// ```
    pub fn catch<F, R>(&self, f: F) -> LazyBox
    where
        F: Fn(Fault) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let f = Arc::new(f);
        self.derive(move |raw, config| {
            let f = Arc::clone(&f);
            resolve(raw, config, keep, move |fault| f(fault).into(), keep)
        })
    }

    /// Transform an error into another error.
    pub fn map_err<F>(&self, f: F) -> LazyBox
    where
        F: Fn(Fault) -> Fault + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.derive(move |raw, config| {
            let f = Arc::clone(&f);
            resolve(raw, config, keep, move |fault| Value::Error(f(fault)), keep)
        })
    }

    /// Add a context breadcrumb to an error flowing through.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let failed = LazyBox::of(Value::error("timeout"))
    ///     .context("fetching profile")
    ///     .context("rendering dashboard");
    ///
    /// let fault = failed.unwrap().unwrap_err();
    /// assert_eq!(fault.context_trail(), &["fetching profile", "rendering dashboard"]);
    /// ```
    pub fn context(&self, msg: impl Into<String>) -> LazyBox {
        let msg = msg.into();
        self.derive(move |raw, config| {
            let msg = msg.clone();
            resolve(raw, config, keep, move |fault| Value::Error(fault.context(msg)), keep)
        })
    }

    /// Run a side effect on a usable value and pass the value through.
    pub fn tap<F>(&self, f: F) -> LazyBox
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.derive(move |raw, config| {
            let f = Arc::clone(&f);
            resolve(
                raw,
                config,
                move |v| {
                    f(&v);
                    v
                },
                keep_error,
                keep,
            )
        })
    }

    /// Resolve `f` on every element of a collection, keeping its shape.
    ///
    /// Bad or failed elements stay in place. Boxes and pending results
    /// returned by `f` are followed down to plain values. A non-collection
    /// value is treated as a single element and returned bare.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let bumped = LazyBox::of(Value::record([("a", 1), ("b", 2)]))
    ///     .traverse(|v| v.as_i64().map(|n| n + 1));
    /// assert_eq!(bumped.run(), Value::record([("a", 2), ("b", 3)]));
    /// ```
    pub fn traverse<F, R>(&self, f: F) -> LazyBox
    where
        F: Fn(Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let f = Arc::new(move |v: Value| -> Value { f(v).into() });
        self.derive(move |raw, config| {
            let f = Arc::clone(&f);
            let inner_config = Arc::clone(config);
            resolve(
                raw,
                config,
                move |container| traverse_value(container, &inner_config, f),
                keep_error,
                keep,
            )
        })
    }

    /// Turn a collection of boxes into a collection of their values.
    pub fn sequence(&self) -> LazyBox {
        self.traverse(keep)
    }

    /// Wrap each element that is not already a box into its own box,
    /// keeping the collection's shape. The inverse of
    /// [`sequence`](LazyBox::sequence).
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{LazyBox, Value};
    ///
    /// let original = Value::list([1, 2, 3]);
    /// let round_trip = LazyBox::of(original.clone()).distribute().sequence();
    /// assert_eq!(round_trip.run(), original);
    /// ```
    pub fn distribute(&self) -> LazyBox {
        self.derive(|raw, config| {
            let inner_config = Arc::clone(config);
            resolve(
                raw,
                config,
                move |container| distribute_value(container, &inner_config),
                keep_error,
                keep,
            )
        })
    }
}

fn keep_if(value: Value, verdict: Value) -> Value {
    match verdict {
        Value::Pending(pending) => {
            Value::Pending(pending.then(move |settled| keep_if(value, settled)))
        }
        Value::Error(fault) => Value::Error(fault),
        verdict if verdict.is_truthy() => value,
        _ => Value::Null,
    }
}
