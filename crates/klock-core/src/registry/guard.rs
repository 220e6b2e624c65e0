use tokio::{sync::oneshot, time::Instant};
use tracing::trace;

use klock_model::Key;

use crate::{registry::RegistryHandle, runner::EntryId};

/// Ownership of a key.
///
/// Exactly one `HeldKey` exists per held key. Dropping it (or calling [`HeldKey::release`])
/// passes the key to the next live waiter, so every path out of a running entry releases once.
pub(crate) struct HeldKey {
    registry: RegistryHandle,
    key: Key,
    id: EntryId,
}

impl HeldKey {
    pub(super) fn new(registry: RegistryHandle, key: Key, id: EntryId) -> Self {
        Self { registry, key, id }
    }

    /// Give the key up.
    #[inline]
    pub(crate) fn release(self) {}
}

impl Drop for HeldKey {
    fn drop(&mut self) {
        trace!(key = %self.key, entry = self.id, "releasing key");
        self.registry.lock().release(&self.key);
    }
}

/// Place of a queued entry.
///
/// The entry either receives its grant ([`Ticket::granted`]) or gives up ([`Ticket::abandon`]).
/// Dropping a ticket gives up as well; a grant that raced the drop is passed on.
pub(crate) struct Ticket {
    registry: RegistryHandle,
    key: Key,
    id: EntryId,
    grant: Option<oneshot::Receiver<()>>,
    enqueued_at: Instant,
}

impl Ticket {
    pub(super) fn new(
        registry: RegistryHandle,
        key: Key,
        id: EntryId,
        grant: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            registry,
            key,
            id,
            grant: Some(grant),
            enqueued_at: Instant::now(),
        }
    }

    /// Time spent in the queue so far.
    pub(crate) fn waited(&self) -> std::time::Duration {
        self.enqueued_at.elapsed()
    }

    /// Wait for the registry to hand over the key.
    ///
    /// Cancel safe: if this future is dropped before the grant arrives, the ticket is still queued.
    pub(crate) async fn granted(&mut self) -> Option<HeldKey> {
        let rx = self.grant.as_mut()?;
        let res = rx.await;
        self.grant = None;
        res.ok()
            .map(|()| HeldKey::new(self.registry.clone(), self.key.clone(), self.id))
    }

    /// Stop waiting.
    ///
    /// Resolved under the registry lock: if the key was already handed over, the grant wins and the
    /// caller now holds the key. Otherwise the waiter is marked abandoned and stays in the queue
    /// until the registry skips it.
    pub(crate) fn abandon(mut self) -> Option<HeldKey> {
        let mut rx = self.grant.take()?;
        let _guard = self.registry.lock();

        match rx.try_recv() {
            Ok(()) => Some(HeldKey::new(
                self.registry.clone(),
                self.key.clone(),
                self.id,
            )),
            Err(_) => {
                drop(rx);
                trace!(key = %self.key, entry = self.id, "waiter abandoned");
                None
            }
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let Some(mut rx) = self.grant.take() else {
            return;
        };
        let mut reg = self.registry.lock();
        if rx.try_recv().is_ok() {
            trace!(key = %self.key, entry = self.id, "dropped ticket had a grant; passing key on");
            reg.release(&self.key);
        }
        // The receiver must close before the lock is released, or a concurrent
        // release could grant into it and the key would never come back.
        drop(rx);
        drop(reg);
    }
}
