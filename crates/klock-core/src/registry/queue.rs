use std::collections::VecDeque;

use tokio::sync::oneshot;

use crate::runner::EntryId;

/// Queued caller waiting for its key.
///
/// The caller keeps the receiving side of `grant`; dropping it marks the waiter as abandoned.
pub(crate) struct Waiter {
    pub(crate) id: EntryId,
    grant: oneshot::Sender<()>,
}

impl Waiter {
    pub(crate) fn new(id: EntryId) -> (Self, oneshot::Receiver<()>) {
        let (grant, rx) = oneshot::channel();
        (Self { id, grant }, rx)
    }

    /// Returns `true` while the caller still waits for this grant.
    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        !self.grant.is_closed()
    }

    /// Hand the key to the caller. Returns `false` if it already gave up.
    pub(crate) fn grant(self) -> bool {
        self.grant.send(()).is_ok()
    }
}

/// FIFO of waiters behind the current holder of one key.
#[derive(Default)]
pub(crate) struct KeyQueue {
    waiters: VecDeque<Waiter>,
}

impl KeyQueue {
    pub(crate) fn push(&mut self, waiter: Waiter) {
        self.waiters.push_back(waiter);
    }

    pub(crate) fn pop(&mut self) -> Option<Waiter> {
        self.waiters.pop_front()
    }

    /// Number of waiters that have not given up yet.
    pub(crate) fn live(&self) -> usize {
        self.waiters.iter().filter(|w| w.is_live()).count()
    }

    /// Drop abandoned waiters, keeping the order of the live ones.
    pub(crate) fn prune(&mut self) {
        self.waiters.retain(Waiter::is_live);
    }

    /// Number of queued waiters, abandoned ones included.
    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_push_order() {
        let mut queue = KeyQueue::default();
        let (a, _ra) = Waiter::new(1);
        let (b, _rb) = Waiter::new(2);
        queue.push(a);
        queue.push(b);

        assert_eq!(queue.pop().map(|w| w.id), Some(1));
        assert_eq!(queue.pop().map(|w| w.id), Some(2));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn dropped_receiver_is_not_live() {
        let mut queue = KeyQueue::default();
        let (a, ra) = Waiter::new(1);
        let (b, _rb) = Waiter::new(2);
        queue.push(a);
        queue.push(b);
        drop(ra);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.live(), 1);

        let abandoned = queue.pop().unwrap();
        assert!(!abandoned.grant());
        let live = queue.pop().unwrap();
        assert!(live.grant());
    }

    #[test]
    fn prune_keeps_live_waiters_in_order() {
        let mut queue = KeyQueue::default();
        let (a, _ra) = Waiter::new(1);
        let (b, rb) = Waiter::new(2);
        let (c, _rc) = Waiter::new(3);
        queue.push(a);
        queue.push(b);
        queue.push(c);
        drop(rb);

        queue.prune();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().map(|w| w.id), Some(1));
        assert_eq!(queue.pop().map(|w| w.id), Some(3));
    }
}
