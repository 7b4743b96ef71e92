//! Collection adapter for the traversal engine
//!
//! [`Entries`] flattens any [`Value`] into an ordered list of
//! `(Key, element)` pairs and remembers the [`Shape`] it came from, so a
//! transformed list can be put back into the same kind of container:
//!
//! - lists and sets are indexed `0..n`
//! - maps and records keep their keys
//! - any other value becomes a single entry under [`Key::Implicit`] and is
//!   returned bare on the way out
//!
//! # Example
//!
//! ```
//! use lazybox::{Entries, Shape, Value};
//!
//! let entries = Entries::from_value(Value::record([("a", 1), ("b", 2)]));
//! assert_eq!(entries.shape(), Shape::Record);
//!
//! let bumped = entries.map_values(|v| Value::from(v.as_i64().map(|n| n * 10)));
//! assert_eq!(bumped.into_value(), Value::record([("a", 10), ("b", 20)]));
//! ```

use std::collections::BTreeMap;

use crate::value::Value;

/// The container kind a set of entries was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A [`Value::List`].
    List,
    /// A [`Value::Set`].
    Set,
    /// A [`Value::Map`].
    Map,
    /// A [`Value::Record`].
    Record,
    /// Any value that is not a collection.
    Single,
}

/// The position of an element within its container.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// Position in a list or set.
    Index(usize),
    /// Record field name.
    Field(String),
    /// Map key.
    Entry(Value),
    /// The sole element of a non-collection value.
    Implicit,
}

impl Key {
    fn into_field(self) -> String {
        match self {
            Key::Field(name) => name,
            Key::Index(i) => i.to_string(),
            Key::Entry(Value::Str(s)) => s,
            Key::Entry(other) => format!("{:?}", other),
            Key::Implicit => String::new(),
        }
    }

    fn into_entry(self) -> Value {
        match self {
            Key::Entry(v) => v,
            Key::Field(name) => Value::Str(name),
            Key::Index(i) => Value::from(i),
            Key::Implicit => Value::Undefined,
        }
    }
}

/// A container taken apart into keyed elements.
#[derive(Debug, Clone)]
pub struct Entries {
    shape: Shape,
    entries: Vec<(Key, Value)>,
}

impl Entries {
    /// Take a value apart.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::List(items) => Entries::indexed(Shape::List, items),
            Value::Set(items) => Entries::indexed(Shape::Set, items),
            Value::Map(pairs) => Entries {
                shape: Shape::Map,
                entries: pairs.into_iter().map(|(k, v)| (Key::Entry(k), v)).collect(),
            },
            Value::Record(fields) => Entries {
                shape: Shape::Record,
                entries: fields.into_iter().map(|(k, v)| (Key::Field(k), v)).collect(),
            },
            single => Entries {
                shape: Shape::Single,
                entries: vec![(Key::Implicit, single)],
            },
        }
    }

    /// Reassemble entries previously split with [`Entries::into_parts`].
    pub fn from_parts(shape: Shape, entries: Vec<(Key, Value)>) -> Self {
        Entries { shape, entries }
    }

    fn indexed(shape: Shape, items: Vec<Value>) -> Self {
        Entries {
            shape,
            entries: items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::Index(i), v))
                .collect(),
        }
    }

    /// The container kind these entries came from.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, element)` pairs in container order.
    pub fn iter(&self) -> impl Iterator<Item = &(Key, Value)> {
        self.entries.iter()
    }

    /// Transform every element, keeping keys and shape.
    pub fn map_values<F>(self, mut f: F) -> Self
    where
        F: FnMut(Value) -> Value,
    {
        Entries {
            shape: self.shape,
            entries: self.entries.into_iter().map(|(k, v)| (k, f(v))).collect(),
        }
    }

    /// Split into shape and pairs.
    pub fn into_parts(self) -> (Shape, Vec<(Key, Value)>) {
        (self.shape, self.entries)
    }

    /// Put the elements back into a container of the original shape.
    ///
    /// Sets drop elements that became equal; a single value comes back bare.
    pub fn into_value(self) -> Value {
        let entries = self.entries;
        match self.shape {
            Shape::List => Value::List(entries.into_iter().map(|(_, v)| v).collect()),
            Shape::Set => Value::set(entries.into_iter().map(|(_, v)| v)),
            Shape::Map => Value::map(entries.into_iter().map(|(k, v)| (k.into_entry(), v))),
            Shape::Record => Value::Record(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into_field(), v))
                    .collect::<BTreeMap<_, _>>(),
            ),
            Shape::Single => entries
                .into_iter()
                .next()
                .map(|(_, v)| v)
                .unwrap_or(Value::Undefined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_is_indexed() {
        let entries = Entries::from_value(Value::list(["a", "b"]));
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(entries.shape(), Shape::List);
        assert_eq!(keys, vec![Key::Index(0), Key::Index(1)]);
    }

    #[test]
    fn test_map_keeps_arbitrary_keys() {
        let map = Value::map([(Value::Int(1), "one"), (Value::Bool(true), "yes")]);
        let entries = Entries::from_value(map.clone());
        assert_eq!(entries.shape(), Shape::Map);
        assert_eq!(entries.iter().next().map(|(k, _)| k.clone()), Some(Key::Entry(Value::Int(1))));
        assert_eq!(entries.into_value(), map);
    }

    #[test]
    fn test_set_collapses_equal_results() {
        let entries = Entries::from_value(Value::set([1, 2, 3]));
        let collapsed = entries.map_values(|_| Value::Int(0));
        assert_eq!(collapsed.into_value(), Value::set([0]));
    }

    #[test]
    fn test_single_value_comes_back_bare() {
        let entries = Entries::from_value(Value::Int(7));
        assert_eq!(entries.shape(), Shape::Single);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.into_value(), Value::Int(7));
    }

    #[test]
    fn test_empty_collections_round_trip() {
        for empty in [
            Value::List(vec![]),
            Value::Set(vec![]),
            Value::Map(vec![]),
            Value::Record(BTreeMap::new()),
        ] {
            let entries = Entries::from_value(empty.clone());
            assert!(entries.is_empty());
            assert_eq!(entries.into_value(), empty);
        }
    }

    #[test]
    fn test_parts_round_trip() {
        let (shape, pairs) = Entries::from_value(Value::record([("x", 1)])).into_parts();
        let rebuilt = Entries::from_parts(shape, pairs).into_value();
        assert_eq!(rebuilt, Value::record([("x", 1)]));
    }
}
