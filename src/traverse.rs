//! Element-wise resolution over collections
//!
//! The traversal engine applies the resolution engine to every element of a
//! collection independently, then puts the results back into the original
//! container kind. An element that is bad or an error keeps its position
//! untouched while its siblings are transformed.
//!
//! - **`traverse`**: resolve `f` on each element, then follow any box or
//!   pending result `f` returned down to a plain value
//! - **`sequence`**: `traverse` with the identity, turning a collection of
//!   boxes into a collection of values
//! - **`distribute`**: the inverse of `sequence`, wrapping every element
//!   that is not already a box into its own box
//!
//! When any element settles asynchronously the whole collection becomes a
//! single pending value. Elements may complete in any order; each result
//! lands at its element's original position.
//!
//! # Example
//!
//! ```
//! use lazybox::{LazyBox, Value};
//!
//! let boxes = Value::list([LazyBox::of(1), LazyBox::of(2)]);
//! assert_eq!(LazyBox::of(boxes).sequence().run(), Value::list([1, 2]));
//! ```

use std::sync::Arc;

use futures::future::join_all;

use crate::collection::Entries;
use crate::config::Configuration;
use crate::lazy::LazyBox;
use crate::resolve::{keep, keep_error, resolve, unwrap_deep};
use crate::value::Value;

/// Resolve `f` on every element of `container`, preserving its shape.
pub(crate) fn traverse_value<F>(container: Value, config: &Arc<Configuration>, f: Arc<F>) -> Value
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    let limit = config.max_unwrap_depth();
    let entries = Entries::from_value(container).map_values(|element| {
        let f = Arc::clone(&f);
        let stepped = resolve(element, config, move |v| f(v), keep_error, keep);
        unwrap_deep(stepped, limit)
    });

    settle_entries(entries)
}

/// Wrap every element that is not already a box, preserving shape.
pub(crate) fn distribute_value(container: Value, config: &Arc<Configuration>) -> Value {
    Entries::from_value(container)
        .map_values(|element| match element {
            Value::Boxed(_) => element,
            other => Value::Boxed(LazyBox::constant(other, Arc::clone(config))),
        })
        .into_value()
}

fn settle_entries(entries: Entries) -> Value {
    if !entries.iter().any(|(_, v)| v.is_pending()) {
        return entries.into_value();
    }

    let (shape, pairs) = entries.into_parts();
    let (keys, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();

    crate::trace_event!(trace, elements = keys.len(), "traversal waiting on pending elements");

    Value::pending(async move {
        let settled = join_all(values.into_iter().map(Value::settle)).await;
        Entries::from_parts(shape, keys.into_iter().zip(settled).collect()).into_value()
    })
}
