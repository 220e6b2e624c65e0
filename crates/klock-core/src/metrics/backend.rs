use std::{sync::Arc, time::Duration};

/// Terminal state of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Operation produced a value.
    Succeeded,
    /// Operation returned an error.
    OperationFailed,
    /// Entry never started: its wait budget ran out first.
    WaitTimeout,
    /// Entry started but exceeded its run budget.
    RunTimeout,
    /// Entry was rejected at submission because the key queue was full.
    QueueFull,
    /// Operation panicked.
    Panicked,
    /// Entry was torn down before settling.
    Dropped,
}

impl Outcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::OperationFailed => "operation_failed",
            Outcome::WaitTimeout => "wait_timeout",
            Outcome::RunTimeout => "run_timeout",
            Outcome::QueueFull => "queue_full",
            Outcome::Panicked => "panicked",
            Outcome::Dropped => "dropped",
        }
    }

    /// Returns `true` if the operation was invoked for this outcome.
    #[inline]
    pub fn did_run(&self) -> bool {
        matches!(
            self,
            Outcome::Succeeded | Outcome::OperationFailed | Outcome::RunTimeout | Outcome::Panicked
        )
    }
}

/// Backend metrics collection interface.
///
/// Keys are deliberately not passed to the backend: they are caller-defined and unbounded,
/// which would explode label cardinality.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a call entering the lock (before admission).
    fn record_submitted(&self);
    /// Record an entry starting to run.
    ///
    /// # Arguments
    /// - `waited`: time spent queued, zero if the key was free
    fn record_started(&self, waited: Duration);
    /// Record an entry settling.
    ///
    /// # Arguments
    /// - `outcome`: how the entry terminated
    /// - `ran`: time spent running, zero if it never ran
    fn record_settled(&self, outcome: Outcome, ran: Duration);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
