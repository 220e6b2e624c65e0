//! Keyed lock: the public entry point tying registry, wait enforcer and runner together.
use std::{fmt, future::Future};

use tokio::time::Instant;
use tracing::{instrument, trace};

use klock_model::{Key, LockConfig, LockOptions};

use crate::{
    error::{CoreError, LockError},
    method::LockedMethod,
    metrics::{MetricsHandle, noop_metrics},
    registry::{Admission, RegistryHandle},
    runner::{self, Entry, next_entry_id},
    settle::{self, PendingResult},
    wait::{self, WaitFailure},
};

/// Serializes asynchronous operations per key.
///
/// - at most one operation per key runs at a time;
/// - operations under the same key start in submission order;
/// - operations under different keys never wait for each other;
/// - a queued operation that waits longer than its wait budget is rejected without running;
/// - a running operation that exceeds its run budget is settled as timed out and the key moves on.
///
/// Cloning is cheap and every clone shares the same registry.
/// Calls must be made from within a tokio runtime.
#[derive(Clone)]
pub struct KeyedLock {
    registry: RegistryHandle,
    config: LockConfig,
    metrics: MetricsHandle,
}

impl KeyedLock {
    /// Create a lock with the given defaults and a no-op metrics backend.
    pub fn new(config: LockConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            registry: RegistryHandle::new(config.max_pending),
            config,
            metrics: noop_metrics(),
        })
    }

    /// Replace the metrics backend and return updated lock.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Defaults this lock was built with.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Submit `op` under `key` and return a handle to its result.
    ///
    /// Admission happens before this function returns, so the submission order of
    /// two `submit` calls is their start order. The operation itself is driven by a
    /// background task and runs even if the returned handle is dropped.
    pub fn submit<F, Fut, T, E>(
        &self,
        key: impl Into<Key>,
        op: F,
        options: LockOptions,
    ) -> PendingResult<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let key = key.into();
        let id = next_entry_id();
        let (settlement, pending) = settle::channel(key.clone(), id);
        self.metrics.record_submitted();

        let entry = Entry {
            id,
            budget: options.resolve(&self.config),
            enqueued_at: Instant::now(),
            key,
            op,
        };
        let metrics = self.metrics.clone();

        match self.registry.admit(&entry.key, id) {
            Admission::Held(held) => {
                tokio::spawn(async move {
                    runner::run(held, entry, settlement, &metrics).await;
                });
            }
            Admission::Queued(ticket) => {
                tokio::spawn(async move {
                    match wait::enforce(ticket, entry.budget.wait).await {
                        Ok(held) => runner::run(held, entry, settlement, &metrics).await,
                        Err(failure) => {
                            let err = match failure {
                                WaitFailure::Expired(waited) => LockError::WaitTimeout {
                                    key: entry.key,
                                    waited,
                                },
                                WaitFailure::Closed => LockError::Dropped { key: entry.key },
                            };
                            let outcome = settlement.settle(Err(err));
                            metrics.record_settled(outcome, std::time::Duration::ZERO);
                        }
                    }
                });
            }
            Admission::Full { limit } => {
                trace!(key = %entry.key, entry = id, limit, "queue full; rejecting");
                let outcome = settlement.settle(Err(LockError::QueueFull {
                    key: entry.key,
                    limit,
                }));
                self.metrics
                    .record_settled(outcome, std::time::Duration::ZERO);
            }
        }
        pending
    }

    /// Run `op` under `key` and wait for its result.
    ///
    /// Resolves with the operation's value, or fails with [`LockError`]:
    /// the operation's own error, a wait or run timeout, or a full queue.
    #[instrument(level = "debug", skip_all, fields(key = %key))]
    pub async fn acquire<F, Fut, T, E>(
        &self,
        key: &str,
        op: F,
        options: LockOptions,
    ) -> Result<T, LockError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.submit(key, op, options).await
    }

    /// Wrap `method` so that every call runs under the fixed lock `name`.
    pub fn lock_method<F>(
        &self,
        name: impl Into<Key>,
        method: F,
        options: LockOptions,
    ) -> LockedMethod<F> {
        LockedMethod::new(self.clone(), name.into(), method, options)
    }

    /// Returns `true` if an operation currently holds `key`.
    pub fn is_busy(&self, key: &str) -> bool {
        self.registry.is_held(key)
    }

    /// Number of calls queued behind the holder of `key` that are still waiting.
    pub fn pending(&self, key: &str) -> usize {
        self.registry.pending(key)
    }

    /// Number of keys currently held.
    pub fn held_keys(&self) -> usize {
        self.registry.held_keys()
    }
}

impl Default for KeyedLock {
    fn default() -> Self {
        let config = LockConfig::default();
        Self {
            registry: RegistryHandle::new(config.max_pending),
            config,
            metrics: noop_metrics(),
        }
    }
}

impl fmt::Debug for KeyedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLock")
            .field("config", &self.config)
            .field("held_keys", &self.held_keys())
            .field("metrics", &"<handle>")
            .finish()
    }
}
