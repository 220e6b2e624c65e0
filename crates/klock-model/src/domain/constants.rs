//! Default budgets applied when a caller does not provide its own.

use crate::domain::TimeoutMs;

/// How long a queued operation may wait for its key before it is rejected.
pub const DEFAULT_WAIT_TIMEOUT_MS: TimeoutMs = 10_000;

/// How long a started operation may run before the key is forcibly passed on.
pub const DEFAULT_RUN_TIMEOUT_MS: TimeoutMs = 5_000;

/// Upper bound of live waiters queued behind a single key.
pub const DEFAULT_MAX_PENDING: usize = 1_000;
