//! Metrics collection abstraction for keyed locks.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are injected with
//! [`crate::KeyedLock::with_metrics`].
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, Outcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
