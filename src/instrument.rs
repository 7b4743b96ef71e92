//! Tracing support for lazy boxes.
//!
//! This module provides the `instrument` method for wrapping a box's
//! evaluation in a tracing span. Feature-gated behind
//! `#[cfg(feature = "tracing")]`.

use std::sync::Arc;

use crate::lazy::LazyBox;
use crate::pending::Pending;
use crate::value::Value;

/// Extension trait for adding tracing instrumentation to boxes.
///
/// This trait is only available when the `tracing` feature is enabled.
pub trait LazyTracingExt {
    /// Evaluate this box inside `span`.
    ///
    /// The span is entered while the producer chain runs. If the chain
    /// yields a pending value, its settlement is instrumented with the same
    /// span, following the standard `tracing::Instrument` pattern for async
    /// code.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use lazybox::{LazyBox, LazyTracingExt};
    /// use tracing::info_span;
    ///
    /// let profile = LazyBox::from_async(move || fetch_profile(user_id))
    ///     .instrument(info_span!("load_profile", user_id = %user_id))
    ///     .map(render);
    /// ```
    fn instrument(&self, span: tracing::Span) -> LazyBox;
}

impl LazyTracingExt for LazyBox {
    fn instrument(&self, span: tracing::Span) -> LazyBox {
        let source = self.clone();
        LazyBox::from_parts(
            Arc::new(move || {
                use tracing::Instrument as _;
                let _entered = span.enter();
                match source.evaluate() {
                    Value::Pending(pending) => {
                        Value::Pending(Pending::new(pending.instrument(span.clone())))
                    }
                    settled => settled,
                }
            }),
            self.shared_configuration(),
        )
    }
}
