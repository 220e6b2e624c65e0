mod constants;
pub use constants::{DEFAULT_MAX_PENDING, DEFAULT_RUN_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Opaque name of a contended resource.
///
/// Operations submitted under the same key never run concurrently.
/// A key exists in the lock registry only while something holds or waits on it.
pub type Key = String;

/// Timeout value in milliseconds.
///
/// Used in lock options and configuration where an explicit time limit is required.
pub type TimeoutMs = u64;
