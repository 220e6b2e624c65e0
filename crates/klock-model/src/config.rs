use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{DEFAULT_MAX_PENDING, DEFAULT_RUN_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS, TimeoutMs},
    error::{ModelError, ModelResult},
};

/// Process-level configuration of a keyed lock.
///
/// Every field falls back to its default when missing from the source document,
/// so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Wait budget used when [`crate::LockOptions`] does not carry one.
    pub default_wait_timeout_ms: TimeoutMs,
    /// Run budget used when [`crate::LockOptions`] does not carry one.
    pub default_run_timeout_ms: TimeoutMs,
    /// Maximum number of live waiters per key; further submissions are rejected.
    pub max_pending: usize,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            default_run_timeout_ms: DEFAULT_RUN_TIMEOUT_MS,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

impl LockConfig {
    /// Check that the defaults can actually be used as budgets.
    ///
    /// Rules:
    /// - both default timeouts are non-zero;
    /// - `max_pending` is non-zero.
    pub fn validate(&self) -> ModelResult<()> {
        if self.default_wait_timeout_ms == 0 {
            return Err(ModelError::ZeroTimeout {
                field: "default_wait_timeout_ms",
            });
        }
        if self.default_run_timeout_ms == 0 {
            return Err(ModelError::ZeroTimeout {
                field: "default_run_timeout_ms",
            });
        }
        if self.max_pending == 0 {
            return Err(ModelError::ZeroMaxPending);
        }
        Ok(())
    }

    #[inline]
    pub fn default_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.default_wait_timeout_ms)
    }

    #[inline]
    pub fn default_run_timeout(&self) -> Duration {
        Duration::from_millis(self.default_run_timeout_ms)
    }

    /// Builder-style override of `max_pending`.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }
}
