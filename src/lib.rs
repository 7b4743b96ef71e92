//! # lazybox
//!
//! > *Write the pipeline once; let the box decide when, whether, and how to run it.*
//!
//! A Rust library for lazy value pipelines that stay linear across three
//! concerns at once:
//!
//! - **Laziness**: nothing runs until a terminal runner forces the chain
//! - **Async transparency**: a stage that returns a pending result suspends
//!   the rest of the chain, without the chain being written differently
//! - **Short-circuiting**: bad values (`Null`, `Undefined`, `NaN` by
//!   default, configurable) and errors skip every callback until something
//!   explicitly recovers them
//!
//! ## Quick Example
//!
//! ```rust
//! use lazybox::{LazyBox, Value};
//!
//! fn parse_port(raw: &str) -> LazyBox {
//!     LazyBox::of(raw)
//!         .map(|v| v.as_str().unwrap_or_default().trim().parse::<i64>())
//!         .filter(|v| v.as_i64().is_some_and(|port| port > 0 && port < 65536))
//!         .recover(|_| 8080)
//! }
//!
//! assert_eq!(parse_port(" 443 ").run(), Value::Int(443));
//! assert_eq!(parse_port("not a port").run(), Value::Int(8080));
//! assert_eq!(parse_port("70000").run(), Value::Int(8080));
//! ```
//!
//! ## Async Example
//!
//! ```rust
//! use lazybox::{LazyBox, Value};
//!
//! # tokio_test::block_on(async {
//! let profile = LazyBox::from_async(|| async { Value::record([("name", "Ada")]) })
//!     .map(|user| user.get("name").cloned())
//!     .map(|name| format!("Hello, {}", name.as_str().unwrap_or_default()));
//!
//! assert_eq!(profile.settle().await, Value::from("Hello, Ada"));
//! # });
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

/// Emit a `tracing` event when the `tracing` feature is enabled.
macro_rules! trace_event {
    ($level:ident, $($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::$level!($($arg)*);
    };
}
pub(crate) use trace_event;

pub mod collection;
pub mod config;
pub mod fault;
pub mod lazy;
pub mod pending;
pub mod resolve;
pub mod testing;
pub mod traverse;
pub mod value;

#[cfg(feature = "serde")]
mod serde_impl;
#[cfg(feature = "tracing")]
pub mod instrument;

// Re-exports
pub use collection::{Entries, Key, Shape};
pub use config::{
    default_configuration, define_default_configuration, is_bad_value,
    restore_default_configuration, Configuration, ConfigurationPatch, Rule,
};
pub use fault::{Fault, FaultKind};
pub use lazy::{is_box, LazyBox};
pub use pending::Pending;
pub use resolve::{resolve, Resolved};
pub use value::{Function, Value};

#[cfg(feature = "tracing")]
pub use instrument::LazyTracingExt;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigurationPatch, Rule};
    pub use crate::fault::Fault;
    pub use crate::lazy::{is_box, LazyBox};
    pub use crate::pending::Pending;
    pub use crate::value::Value;
}
