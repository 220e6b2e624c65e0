use std::time::Duration;

use thiserror::Error;

use klock_model::{Key, ModelError};

use crate::metrics::Outcome;

/// Failure of a keyed lock construction.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid lock configuration: {0}")]
    Config(#[from] ModelError),
}

/// Failure of a single call submitted under a key.
///
/// `E` is the error type of the wrapped operation and is returned unmodified in [`LockError::Operation`].
/// Every other variant is produced by the lock itself.
#[derive(Debug, Error)]
pub enum LockError<E> {
    /// The operation ran and failed.
    #[error("{0}")]
    Operation(E),

    /// The call stayed queued longer than its wait budget; the operation was never invoked.
    #[error("timed out after {waited:?} waiting for lock '{key}'")]
    WaitTimeout { key: Key, waited: Duration },

    /// The operation started but did not finish within its run budget.
    #[error("operation under lock '{key}' exceeded run timeout of {limit:?}")]
    RunTimeout { key: Key, limit: Duration },

    /// The key already had `limit` live waiters.
    #[error("too many pending calls for lock '{key}' (limit {limit})")]
    QueueFull { key: Key, limit: usize },

    /// The operation panicked.
    #[error("operation under lock '{key}' panicked: {message}")]
    Panicked { key: Key, message: String },

    /// The entry was torn down before it settled (runtime shutdown).
    #[error("lock entry for '{key}' was dropped before settling")]
    Dropped { key: Key },
}

impl<E> LockError<E> {
    /// Classify this failure for metrics and logs.
    pub fn outcome(&self) -> Outcome {
        match self {
            LockError::Operation(_) => Outcome::OperationFailed,
            LockError::WaitTimeout { .. } => Outcome::WaitTimeout,
            LockError::RunTimeout { .. } => Outcome::RunTimeout,
            LockError::QueueFull { .. } => Outcome::QueueFull,
            LockError::Panicked { .. } => Outcome::Panicked,
            LockError::Dropped { .. } => Outcome::Dropped,
        }
    }

    #[inline]
    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, LockError::WaitTimeout { .. })
    }

    #[inline]
    pub fn is_run_timeout(&self) -> bool {
        matches!(self, LockError::RunTimeout { .. })
    }

    /// Returns the operation's own error, if that is what this is.
    pub fn into_operation(self) -> Option<E> {
        match self {
            LockError::Operation(e) => Some(e),
            _ => None,
        }
    }
}
