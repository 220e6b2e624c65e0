//! Keyed serialization of asynchronous operations.
//!
//! [`KeyedLock`] guarantees at most one in-flight operation per key, starts
//! contenders in submission order and fails calls that wait or run too long.
mod error;
pub use error::{CoreError, LockError};

mod lock;
pub use lock::KeyedLock;

mod method;
pub use method::LockedMethod;

mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoOpMetrics, Outcome, noop_metrics};

mod registry;

mod runner;

mod settle;
pub use settle::PendingResult;

mod wait;

pub mod prelude {
    pub use crate::error::{CoreError, LockError};
    pub use crate::lock::KeyedLock;
    pub use crate::method::LockedMethod;
    pub use crate::settle::PendingResult;
    pub use klock_model::{Key, LockConfig, LockOptions};
}
