use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{config::LockConfig, domain::TimeoutMs};

/// Per-call timeout budgets.
///
/// Missing values are filled from [`LockConfig`] when the call is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockOptions {
    /// Maximum time the call may stay queued before it is rejected without running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_timeout_ms: Option<TimeoutMs>,
    /// Maximum time the call may run before the key is passed on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout_ms: Option<TimeoutMs>,
}

impl LockOptions {
    /// Options with both budgets set explicitly.
    pub fn new(wait_timeout_ms: TimeoutMs, run_timeout_ms: TimeoutMs) -> Self {
        Self {
            wait_timeout_ms: Some(wait_timeout_ms),
            run_timeout_ms: Some(run_timeout_ms),
        }
    }

    pub fn with_wait_timeout(mut self, ms: TimeoutMs) -> Self {
        self.wait_timeout_ms = Some(ms);
        self
    }

    pub fn with_run_timeout(mut self, ms: TimeoutMs) -> Self {
        self.run_timeout_ms = Some(ms);
        self
    }

    /// Resolve the budgets of a single call against the lock defaults.
    pub fn resolve(&self, defaults: &LockConfig) -> Budget {
        Budget {
            wait: self
                .wait_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| defaults.default_wait_timeout()),
            run: self
                .run_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| defaults.default_run_timeout()),
        }
    }
}

/// Resolved time budgets of one queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Maximum queued time.
    pub wait: Duration,
    /// Maximum running time.
    pub run: Duration,
}
