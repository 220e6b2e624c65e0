use std::time::Duration;

use crate::metrics::backend::{MetricsBackend, Outcome};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_submitted(&self) {}

    #[inline(always)]
    fn record_started(&self, _: Duration) {}

    #[inline(always)]
    fn record_settled(&self, _: Outcome, _: Duration) {}
}
