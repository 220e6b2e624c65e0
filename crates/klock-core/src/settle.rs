//! Exactly-once result delivery.
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use klock_model::Key;

use crate::{error::LockError, metrics::Outcome, runner::EntryId};

type Slot<T, E> = Result<T, LockError<E>>;

/// Create the two ends of an entry's result slot.
pub(crate) fn channel<T, E>(key: Key, id: EntryId) -> (Settlement<T, E>, PendingResult<T, E>) {
    let (tx, rx) = oneshot::channel();
    (
        Settlement {
            tx,
            key: key.clone(),
            id,
        },
        PendingResult { rx, key },
    )
}

/// Write side of an entry's result slot.
///
/// `settle` consumes the value, so an entry can be settled at most once.
pub(crate) struct Settlement<T, E> {
    tx: oneshot::Sender<Slot<T, E>>,
    key: Key,
    id: EntryId,
}

impl<T, E> Settlement<T, E> {
    /// Fulfil the slot and report how the entry ended.
    pub(crate) fn settle(self, result: Slot<T, E>) -> Outcome {
        let outcome = match &result {
            Ok(_) => Outcome::Succeeded,
            Err(e) => e.outcome(),
        };

        match outcome {
            Outcome::Succeeded | Outcome::OperationFailed => {
                debug!(key = %self.key, entry = self.id, outcome = outcome.as_label(), "entry settled");
            }
            _ => {
                warn!(key = %self.key, entry = self.id, outcome = outcome.as_label(), "entry settled");
            }
        }

        if self.tx.send(result).is_err() {
            trace!(key = %self.key, entry = self.id, "result handle dropped; discarding result");
        }
        outcome
    }
}

/// Handle to the eventual result of a call submitted with [`crate::KeyedLock::submit`].
///
/// Resolves exactly once. Dropping the handle does not cancel the call: it still runs in turn
/// and its result is discarded.
pub struct PendingResult<T, E> {
    rx: oneshot::Receiver<Slot<T, E>>,
    key: Key,
}

impl<T, E> PendingResult<T, E> {
    /// Key the call was submitted under.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T, E> Future for PendingResult<T, E> {
    type Output = Slot<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(LockError::Dropped {
                key: this.key.clone(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}
