//! The error half of a pipeline
//!
//! A [`Fault`] is what a [`LazyBox`](crate::LazyBox) carries forward when
//! something went wrong: a callback returned `Err`, a callback panicked, a
//! pending result was rejected, or nested boxes could not be unwrapped. It
//! keeps a trail of context breadcrumbs that accumulate as the fault flows
//! through later stages.
//!
//! # Examples
//!
//! ```
//! use lazybox::Fault;
//!
//! let fault = Fault::new("file not found")
//!     .context("reading config file")
//!     .context("initializing application");
//!
//! assert_eq!(fault.message(), "file not found");
//! assert_eq!(fault.context_trail().len(), 2);
//! ```

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Where a fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Raised explicitly, usually from an `Err` returned by a callback.
    Raised,
    /// A callback, predicate, producer or pending future panicked.
    Panicked,
    /// Nested boxes or pending results exceeded the configured unwrap depth.
    DepthExceeded,
}

/// An error value that accumulates context as it propagates.
///
/// Faults are cheap to clone: the optional source error is shared.
///
/// # Examples
///
/// ```
/// use lazybox::Fault;
///
/// let fault = Fault::new("connection refused")
///     .context("connecting to database")
///     .context("loading user profile");
///
/// println!("{}", fault);
/// // Output:
/// // Error: connection refused
/// //   -> connecting to database
/// //   -> loading user profile
/// ```
#[derive(Clone)]
pub struct Fault {
    kind: FaultKind,
    message: String,
    source: Option<Arc<dyn StdError + Send + Sync>>,
    context: Vec<String>,
}

impl Fault {
    /// Create a new fault with an empty context trail.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazybox::{Fault, FaultKind};
    ///
    /// let fault = Fault::new("base error");
    /// assert_eq!(fault.kind(), FaultKind::Raised);
    /// assert!(fault.context_trail().is_empty());
    /// ```
    pub fn new(message: impl Into<String>) -> Self {
        Fault {
            kind: FaultKind::Raised,
            message: message.into(),
            source: None,
            context: Vec::new(),
        }
    }

    /// Wrap an existing error, keeping it reachable through
    /// [`std::error::Error::source`].
    ///
    /// # Examples
    ///
    /// ```
    /// use lazybox::Fault;
    ///
    /// let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    /// let fault = Fault::from_error(io);
    /// assert_eq!(fault.message(), "missing");
    /// ```
    pub fn from_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Fault {
            kind: FaultKind::Raised,
            message: error.to_string(),
            source: Some(Arc::new(error)),
            context: Vec::new(),
        }
    }

    /// Build a fault from a panic payload caught while evaluating user code.
    pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "callback panicked".to_string()
        };

        Fault {
            kind: FaultKind::Panicked,
            message,
            source: None,
            context: Vec::new(),
        }
    }

    pub(crate) fn depth_exceeded(limit: usize) -> Self {
        Fault {
            kind: FaultKind::DepthExceeded,
            message: format!("unwrap depth exceeded ({} levels)", limit),
            source: None,
            context: Vec::new(),
        }
    }

    /// Add a context layer.
    ///
    /// Context messages accumulate in the order they're added, inner to outer.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazybox::Fault;
    ///
    /// let fault = Fault::new("parse error")
    ///     .context("reading config file")
    ///     .context("initializing app");
    ///
    /// assert_eq!(fault.context_trail(), &["reading config file", "initializing app"]);
    /// ```
    pub fn context(mut self, msg: impl Into<String>) -> Self {
        self.context.push(msg.into());
        self
    }

    /// Where this fault came from.
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// The underlying message, without context.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The context trail, inner to outer.
    pub fn context_trail(&self) -> &[String] {
        &self.context
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("context", &self.context)
            .finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)?;

        for ctx in &self.context {
            write!(f, "\n  -> {}", ctx)?;
        }

        Ok(())
    }
}

impl PartialEq for Fault {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message && self.context == other.context
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Fault::new(message)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Fault::new(message)
    }
}

impl From<std::io::Error> for Fault {
    fn from(error: std::io::Error) -> Self {
        Fault::from_error(error)
    }
}

impl From<std::num::ParseIntError> for Fault {
    fn from(error: std::num::ParseIntError) -> Self {
        Fault::from_error(error)
    }
}

impl From<std::num::ParseFloatError> for Fault {
    fn from(error: std::num::ParseFloatError) -> Self {
        Fault::from_error(error)
    }
}
