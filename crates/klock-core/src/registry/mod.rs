//! Key queue registry.
//!
//! Maps every non-idle key to the FIFO of callers waiting behind its current holder.
//! A key is present in the map iff it is held; it is removed as soon as its queue drains.
//!
//! All transitions (admission, hand-off, abandonment) run under one mutex,
//! which is never held across an `.await`.
mod guard;
pub(crate) use guard::{HeldKey, Ticket};

mod queue;
use queue::{KeyQueue, Waiter};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::{trace, warn};

use klock_model::Key;

use crate::runner::EntryId;

/// Result of submitting an entry under a key.
pub(crate) enum Admission {
    /// Key was idle and is now held by the entry.
    Held(HeldKey),
    /// Key is held by someone else; the entry waits on the ticket.
    Queued(Ticket),
    /// Key already has `limit` waiters.
    Full { limit: usize },
}

/// Registry state guarded by [`RegistryHandle`].
pub(crate) struct Registry {
    keys: HashMap<Key, KeyQueue>,
    max_pending: usize,
}

impl Registry {
    /// Pass `key` to its next live waiter, or mark it idle if nobody is waiting.
    ///
    /// Abandoned waiters met on the way are discarded without being started.
    pub(crate) fn release(&mut self, key: &str) {
        let Some(queue) = self.keys.get_mut(key) else {
            warn!(key = %key, "release of an idle key ignored");
            return;
        };

        while let Some(waiter) = queue.pop() {
            let id = waiter.id;
            if waiter.grant() {
                trace!(key = %key, entry = id, "key handed to next waiter");
                return;
            }
            trace!(key = %key, entry = id, "skipping abandoned waiter");
        }

        self.keys.remove(key);
        trace!(key = %key, "key is idle");
    }
}

/// Shared, clonable access to the registry of one lock instance.
#[derive(Clone)]
pub(crate) struct RegistryHandle {
    inner: Arc<Mutex<Registry>>,
}

impl RegistryHandle {
    pub(crate) fn new(max_pending: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                keys: HashMap::new(),
                max_pending,
            })),
        }
    }

    /// Enter the critical section.
    ///
    /// Nothing panics while the guard is held, so a poisoned mutex still carries consistent state.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit entry `id` under `key` in a single atomic step.
    ///
    /// Waiters that gave up are pruned first, so the queue never grows past `max_pending`.
    pub(crate) fn admit(&self, key: &str, id: EntryId) -> Admission {
        let mut guard = self.lock();
        let reg = &mut *guard;

        if let Some(queue) = reg.keys.get_mut(key) {
            queue.prune();
            if queue.len() >= reg.max_pending {
                return Admission::Full {
                    limit: reg.max_pending,
                };
            }
            let (waiter, rx) = Waiter::new(id);
            queue.push(waiter);
            trace!(key = %key, entry = id, "key busy; entry queued");
            return Admission::Queued(Ticket::new(self.clone(), key.to_owned(), id, rx));
        }

        reg.keys.insert(key.to_owned(), KeyQueue::default());
        trace!(key = %key, entry = id, "key idle; entry holds it");
        Admission::Held(HeldKey::new(self.clone(), key.to_owned(), id))
    }

    /// Returns `true` if some entry currently holds `key`.
    pub(crate) fn is_held(&self, key: &str) -> bool {
        self.lock().keys.contains_key(key)
    }

    /// Number of live waiters queued behind the holder of `key`.
    pub(crate) fn pending(&self, key: &str) -> usize {
        self.lock().keys.get(key).map_or(0, KeyQueue::live)
    }

    /// Number of keys that are currently held.
    pub(crate) fn held_keys(&self) -> usize {
        self.lock().keys.len()
    }

    /// Drop every waiter of `key` without granting it.
    #[cfg(test)]
    pub(crate) fn discard_waiters(&self, key: &str) {
        if let Some(queue) = self.lock().keys.get_mut(key) {
            while queue.pop().is_some() {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(adm: Admission) -> HeldKey {
        match adm {
            Admission::Held(h) => h,
            _ => panic!("expected Admission::Held"),
        }
    }

    fn queued(adm: Admission) -> Ticket {
        match adm {
            Admission::Queued(t) => t,
            _ => panic!("expected Admission::Queued"),
        }
    }

    #[test]
    fn first_entry_holds_and_release_makes_key_idle() {
        let reg = RegistryHandle::new(8);
        let h = held(reg.admit("a", 1));

        assert!(reg.is_held("a"));
        assert_eq!(reg.held_keys(), 1);

        h.release();
        assert!(!reg.is_held("a"));
        assert_eq!(reg.held_keys(), 0);
    }

    #[test]
    fn second_entry_is_queued_and_counted() {
        let reg = RegistryHandle::new(8);
        let _h = held(reg.admit("a", 1));
        let _t = queued(reg.admit("a", 2));

        assert_eq!(reg.pending("a"), 1);
        assert_eq!(reg.pending("b"), 0);
    }

    #[test]
    fn different_keys_do_not_contend() {
        let reg = RegistryHandle::new(8);
        let _a = held(reg.admit("a", 1));
        let _b = held(reg.admit("b", 2));

        assert_eq!(reg.held_keys(), 2);
    }

    #[test]
    fn admission_is_rejected_when_queue_is_full() {
        let reg = RegistryHandle::new(1);
        let _h = held(reg.admit("a", 1));
        let _t = queued(reg.admit("a", 2));

        match reg.admit("a", 3) {
            Admission::Full { limit } => assert_eq!(limit, 1),
            _ => panic!("expected Admission::Full"),
        }
    }

    #[test]
    fn abandoned_waiters_free_queue_capacity() {
        let reg = RegistryHandle::new(1);
        let _h = held(reg.admit("a", 1));
        let t = queued(reg.admit("a", 2));
        assert!(t.abandon().is_none());

        assert_eq!(reg.pending("a"), 0);
        let _t2 = queued(reg.admit("a", 3));
        assert_eq!(reg.lock().keys["a"].len(), 1);
    }

    #[test]
    fn impatient_waiters_do_not_grow_the_queue() {
        let reg = RegistryHandle::new(1);
        let _h = held(reg.admit("a", 1));

        for id in 2..10_002 {
            let t = queued(reg.admit("a", id));
            assert!(t.abandon().is_none());
        }

        assert!(reg.lock().keys["a"].len() <= 1);
        assert_eq!(reg.pending("a"), 0);

        let _live = queued(reg.admit("a", 10_002));
        assert!(matches!(reg.admit("a", 10_003), Admission::Full { limit: 1 }));
    }

    #[test]
    fn release_skips_abandoned_and_goes_idle() {
        let reg = RegistryHandle::new(8);
        let h = held(reg.admit("a", 1));
        let t = queued(reg.admit("a", 2));
        assert!(t.abandon().is_none());

        h.release();
        assert!(!reg.is_held("a"));
    }

    #[test]
    fn release_of_idle_key_is_ignored() {
        let reg = RegistryHandle::new(8);
        reg.lock().release("ghost");
        assert_eq!(reg.held_keys(), 0);
    }
}
