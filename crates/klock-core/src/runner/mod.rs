//! Operation runner: executes a granted entry under its run budget and releases the key.
mod id;
pub use id::EntryId;
pub(crate) use id::next_entry_id;

use std::{any::Any, future::Future, time::Duration};

use tokio::{
    task::JoinError,
    time::{self, Instant},
};
use tracing::{debug, warn};

use klock_model::{Budget, Key};

use crate::{error::LockError, metrics::MetricsHandle, registry::HeldKey, settle::Settlement};

/// One submitted call, from admission until it starts.
pub(crate) struct Entry<F> {
    pub(crate) id: EntryId,
    pub(crate) key: Key,
    pub(crate) op: F,
    pub(crate) budget: Budget,
    pub(crate) enqueued_at: Instant,
}

/// Run a granted entry to settlement.
///
/// Order of effects: operation invoked once, result settled once, key released once.
pub(crate) async fn run<F, Fut, T, E>(
    held: HeldKey,
    entry: Entry<F>,
    settlement: Settlement<T, E>,
    metrics: &MetricsHandle,
) where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let waited = entry.enqueued_at.elapsed();
    metrics.record_started(waited);
    debug!(key = %entry.key, entry = entry.id, ?waited, "operation started");

    let started = Instant::now();
    let result = execute(&entry.key, entry.op, entry.budget.run).await;
    let ran = started.elapsed();

    let outcome = settlement.settle(result);
    metrics.record_settled(outcome, ran);
    held.release();
}

/// Invoke `op` on its own task and wait for it at most `limit`.
///
/// On timeout the task is detached, not aborted: the operation may still complete later,
/// but nothing observes it.
async fn execute<F, Fut, T, E>(key: &Key, op: F, limit: Duration) -> Result<T, LockError<E>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let mut handle = tokio::spawn(async move { op().await });

    match time::timeout(limit, &mut handle).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(e))) => Err(LockError::Operation(e)),
        Ok(Err(join)) => Err(join_failure(key, join)),
        Err(_) => {
            warn!(key = %key, ?limit, "run timeout hit; detaching operation");
            Err(LockError::RunTimeout {
                key: key.clone(),
                limit,
            })
        }
    }
}

fn join_failure<E>(key: &Key, err: JoinError) -> LockError<E> {
    if err.is_panic() {
        LockError::Panicked {
            key: key.clone(),
            message: panic_message(err.into_panic()),
        }
    } else {
        LockError::Dropped { key: key.clone() }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn value_and_error_are_captured() {
        let key: Key = "k".into();

        let ok = execute(&key, || async { Ok::<_, String>(5) }, Duration::from_secs(1)).await;
        assert_eq!(ok.unwrap(), 5);

        let err = execute(
            &key,
            || async { Err::<u8, _>("bad".to_string()) },
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(err.unwrap_err().into_operation().as_deref(), Some("bad"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_operation_hits_run_timeout() {
        let key: Key = "k".into();
        let start = Instant::now();

        let res = execute(
            &key,
            || std::future::pending::<Result<(), String>>(),
            Duration::from_millis(20),
        )
        .await;

        assert!(res.unwrap_err().is_run_timeout());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(20), "settled early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(25), "settled late: {elapsed:?}");
    }

    #[tokio::test]
    async fn panic_is_reported_with_message() {
        let key: Key = "k".into();

        let res = execute(
            &key,
            || async {
                if true {
                    panic!("kaboom");
                }
                Ok::<(), String>(())
            },
            Duration::from_secs(1),
        )
        .await;

        match res {
            Err(LockError::Panicked { key, message }) => {
                assert_eq!(key, "k");
                assert_eq!(message, "kaboom");
            }
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[test]
    fn non_string_panic_payload_has_fallback_message() {
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic payload");
        assert_eq!(panic_message(Box::new("s")), "s");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
    }
}
