//! The dynamic value flowing through a pipeline
//!
//! Every stage of a [`LazyBox`] produces a [`Value`]. Beyond the plain data
//! variants, four tagged variants carry the states the resolution engine
//! dispatches on:
//!
//! - [`Value::Pending`] - an asynchronous result that has not settled yet
//! - [`Value::Boxed`] - a nested, still-lazy box
//! - [`Value::Error`] - a [`Fault`] travelling forward as data
//! - collections ([`Value::List`], [`Value::Set`], [`Value::Map`],
//!   [`Value::Record`]) - shapes the traversal engine walks element-wise
//!
//! # Examples
//!
//! ```
//! use lazybox::Value;
//!
//! let v = Value::from(vec![1, 2, 3]);
//! assert_eq!(v, Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
//!
//! let missing: Value = None::<i64>.into();
//! assert!(missing.is_null());
//!
//! let failed: Value = Err::<i64, _>("boom").into();
//! assert!(failed.is_error());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::fault::Fault;
use crate::lazy::LazyBox;
use crate::pending::Pending;

/// A callable value, applied by [`LazyBox::ap`].
///
/// Functions compare by identity.
#[derive(Clone)]
pub struct Function(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl Function {
    /// Wrap a closure as a callable value.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        Function(Arc::new(move |v| f(v).into()))
    }

    /// Apply the function.
    pub fn call(&self, arg: Value) -> Value {
        (self.0)(arg)
    }

    /// Returns `true` if both handles point at the same closure.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function(<function>)")
    }
}

/// A value produced by a pipeline stage.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// No value at all.
    #[default]
    Undefined,
    /// An explicit absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float; `NaN` is a bad value under the default configuration.
    Float(f64),
    /// A string.
    Str(String),
    /// An ordered sequence.
    List(Vec<Value>),
    /// An insertion-ordered collection of distinct values.
    ///
    /// Build with [`Value::set`] to drop duplicates. Equality is membership
    /// in both directions, so duplicates in a hand-built set never change
    /// what it equals.
    Set(Vec<Value>),
    /// An insertion-ordered keyed collection with arbitrary keys.
    Map(Vec<(Value, Value)>),
    /// A plain record with string fields.
    ///
    /// Fields are kept in key order, not insertion order; a traversed
    /// record comes back sorted by field name.
    Record(BTreeMap<String, Value>),
    /// A callable value.
    Function(Function),
    /// A nested lazy box.
    Boxed(LazyBox),
    /// An asynchronous result that may not have settled yet.
    Pending(Pending),
    /// An error carried forward as data.
    Error(Fault),
}

impl Value {
    /// Wrap a closure as a [`Value::Function`].
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::Value;
    ///
    /// let inc = Value::function(|v: Value| v.as_i64().map(|n| n + 1));
    /// assert!(inc.is_function());
    /// ```
    pub fn function<F, R>(f: F) -> Self
    where
        F: Fn(Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        Value::Function(Function::new(f))
    }

    /// Wrap a future as a [`Value::Pending`].
    pub fn pending<F, T>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Into<Value> + 'static,
    {
        Value::Pending(Pending::from_future(future))
    }

    /// Build a [`Value::Error`] from a message.
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(Fault::new(message))
    }

    /// Build a [`Value::List`].
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a [`Value::Set`], dropping duplicates while keeping first-seen order.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::Value;
    ///
    /// let set = Value::set([1, 2, 2, 3, 1]);
    /// assert_eq!(set, Value::set([1, 2, 3]));
    /// ```
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let mut distinct: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !distinct.contains(&item) {
                distinct.push(item);
            }
        }
        Value::Set(distinct)
    }

    /// Build a [`Value::Map`]. A repeated key overwrites the earlier entry in place.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut pairs: Vec<(Value, Value)> = Vec::new();
        for (k, v) in entries {
            let (k, v) = (k.into(), v.into());
            match pairs.iter_mut().find(|(existing, _)| *existing == k) {
                Some(slot) => slot.1 = v,
                None => pairs.push((k, v)),
            }
        }
        Value::Map(pairs)
    }

    /// Build a [`Value::Record`].
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::Value;
    ///
    /// let user = Value::record([("name", Value::from("Ada")), ("age", Value::from(36))]);
    /// assert_eq!(user.get("age"), Some(&Value::Int(36)));
    /// ```
    pub fn record<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wait for a pending value to settle; other values are returned as-is.
    pub async fn settle(self) -> Value {
        match self {
            Value::Pending(pending) => pending.await,
            other => other,
        }
    }

    /// Returns `true` for [`Value::Undefined`].
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for a float `NaN`.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Float(f) if f.is_nan())
    }

    /// Returns `true` for [`Value::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Returns `true` for [`Value::Pending`].
    pub fn is_pending(&self) -> bool {
        matches!(self, Value::Pending(_))
    }

    /// Returns `true` for [`Value::Boxed`].
    pub fn is_box(&self) -> bool {
        matches!(self, Value::Boxed(_))
    }

    /// Returns `true` for [`Value::Function`].
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Returns `true` for lists, sets, maps and records.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::Set(_) | Value::Map(_) | Value::Record(_)
        )
    }

    /// Truthiness: `false`, zero, `NaN`, the empty string, `Null` and
    /// `Undefined` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => !(f.is_nan() || *f == 0.0),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The integer inside a [`Value::Int`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The number inside a [`Value::Int`] or [`Value::Float`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The boolean inside a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string inside a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The fault inside a [`Value::Error`].
    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Value::Error(fault) => Some(fault),
            _ => None,
        }
    }

    /// Look up a record field or a string-keyed map entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(key),
            Value::Map(pairs) => pairs
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a list element by position.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) | Value::Set(items) => items.get(index),
            _ => None,
        }
    }

    /// A short name for the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Function(_) => "function",
            Value::Boxed(_) => "box",
            Value::Pending(_) => "pending",
            Value::Error(_) => "error",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.iter().all(|item| b.contains(item)) && b.iter().all(|item| a.contains(item))
            }
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Boxed(a), Value::Boxed(b)) => a.ptr_eq(b),
            (Value::Pending(a), Value::Pending(b)) => a.ptr_eq(b),
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n)
            .map(Value::Int)
            .unwrap_or(Value::Float(n as f64))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(fields: BTreeMap<String, T>) -> Self {
        Value::record(fields)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<T, E> From<Result<T, E>> for Value
where
    T: Into<Value>,
    E: Into<Fault>,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => v.into(),
            Err(e) => Value::Error(e.into()),
        }
    }
}

impl From<Fault> for Value {
    fn from(fault: Fault) -> Self {
        Value::Error(fault)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<LazyBox> for Value {
    fn from(b: LazyBox) -> Self {
        Value::Boxed(b)
    }
}

impl From<Pending> for Value {
    fn from(p: Pending) -> Self {
        Value::Pending(p)
    }
}
