//! Wait timeout enforcement for queued entries.
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use crate::registry::{HeldKey, Ticket};

/// Why a queued entry never got its key.
#[derive(Debug)]
pub(crate) enum WaitFailure {
    /// The wait budget ran out after waiting this long.
    Expired(Duration),
    /// The grant channel closed without a grant.
    Closed,
}

/// Wait for `ticket` to be granted, at most `limit`.
///
/// Returns the held key, or why the entry must not run.
/// A grant that was delivered before the timer could abandon the ticket wins.
pub(crate) async fn enforce(
    mut ticket: Ticket,
    limit: Duration,
) -> Result<HeldKey, WaitFailure> {
    match time::timeout(limit, ticket.granted()).await {
        Ok(Some(held)) => Ok(held),
        Ok(None) => {
            warn!(waited = ?ticket.waited(), "grant channel closed without a grant");
            Err(WaitFailure::Closed)
        }
        Err(_) => {
            let waited = ticket.waited();
            match ticket.abandon() {
                Some(held) => {
                    debug!(?waited, "grant raced wait timeout; entry runs");
                    Ok(held)
                }
                None => Err(WaitFailure::Expired(waited)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Admission, RegistryHandle};

    #[tokio::test(start_paused = true)]
    async fn expires_when_holder_keeps_the_key() {
        let reg = RegistryHandle::new(8);
        let Admission::Held(_h) = reg.admit("k", 1) else {
            panic!("expected Held");
        };
        let Admission::Queued(t) = reg.admit("k", 2) else {
            panic!("expected Queued");
        };

        let Err(WaitFailure::Expired(waited)) = enforce(t, Duration::from_millis(10)).await
        else {
            panic!("wait must time out");
        };
        assert!(waited >= Duration::from_millis(10), "expired early: {waited:?}");
        assert!(waited < Duration::from_millis(15), "expired late: {waited:?}");
        assert_eq!(reg.pending("k"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn granted_before_deadline() {
        let reg = RegistryHandle::new(8);
        let Admission::Held(h) = reg.admit("k", 1) else {
            panic!("expected Held");
        };
        let Admission::Queued(t) = reg.admit("k", 2) else {
            panic!("expected Queued");
        };

        let releaser = tokio::spawn(async move {
            time::sleep(Duration::from_millis(5)).await;
            h.release();
        });

        let held = enforce(t, Duration::from_millis(50)).await;
        assert!(held.is_ok());
        releaser.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_budget_still_accepts_a_pending_grant() {
        let reg = RegistryHandle::new(8);
        let Admission::Held(h) = reg.admit("k", 1) else {
            panic!("expected Held");
        };
        let Admission::Queued(t) = reg.admit("k", 2) else {
            panic!("expected Queued");
        };

        h.release();
        assert!(enforce(t, Duration::ZERO).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_grant_is_not_reported_as_timeout() {
        let reg = RegistryHandle::new(8);
        let Admission::Held(_h) = reg.admit("k", 1) else {
            panic!("expected Held");
        };
        let Admission::Queued(t) = reg.admit("k", 2) else {
            panic!("expected Queued");
        };

        reg.discard_waiters("k");
        let res = enforce(t, Duration::from_millis(50)).await;
        assert!(matches!(res, Err(WaitFailure::Closed)));
        assert!(reg.is_held("k"));
    }
}
