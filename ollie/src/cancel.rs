//! Cancellation tokens.
//!
//! A [`CancelSlot`] holds the token that is *current* for a client. Every
//! request snapshots the current token when it is issued. Calling
//! [`CancelSlot::cancel`] trips that token, which aborts every in-flight
//! request holding it, and installs a fresh token so the client can be reused
//! immediately.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// A cancellation flag plus the generation it belongs to.
///
/// Cloning is cheap; clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
    generation: u64,
}

impl CancelToken {
    /// Create an unset, request-scoped token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    const fn with_generation(inner: CancellationToken, generation: u64) -> Self {
        Self { inner, generation }
    }

    /// Trip the token. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Whether the token has been tripped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Generation counter of the slot that issued this token.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolves once the token is tripped.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }

    /// Drive `fut` to completion unless the token trips first.
    ///
    /// Returns [`Error::Cancelled`] if the token is already tripped, without
    /// polling `fut` at all.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.inner.cancelled() => Err(Error::Cancelled),
            out = fut => out,
        }
    }
}

/// Holder of the currently active [`CancelToken`] of one client.
#[derive(Debug, Default)]
pub struct CancelSlot {
    active: RwLock<CancelToken>,
}

impl CancelSlot {
    /// Create a slot with an unset generation-0 token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the active token, to attach to a new request.
    #[must_use]
    pub fn current(&self) -> CancelToken {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Trip the active token and install a fresh one.
    ///
    /// Requests that captured the old token fail with [`Error::Cancelled`];
    /// requests issued afterwards use the new token. Safe to call repeatedly.
    pub fn cancel(&self) {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        active.cancel();
        let next = active.generation.wrapping_add(1);
        *active = CancelToken::with_generation(CancellationToken::new(), next);
        tracing::debug!(generation = next, "cancelled in-flight requests");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod token {
        use super::*;

        #[test]
        fn starts_unset() {
            let token = CancelToken::new();
            assert!(!token.is_cancelled());
            assert_eq!(token.generation(), 0);
        }

        #[test]
        fn clones_share_the_flag() {
            let token = CancelToken::new();
            let clone = token.clone();
            token.cancel();
            assert!(clone.is_cancelled());
        }

        #[tokio::test]
        async fn run_completes_when_not_cancelled() {
            let token = CancelToken::new();
            let out = token.run(async { Ok(7) }).await.unwrap();
            assert_eq!(out, 7);
        }

        #[tokio::test]
        async fn run_short_circuits_when_already_cancelled() {
            let token = CancelToken::new();
            token.cancel();
            let polled = std::sync::atomic::AtomicBool::new(false);
            let err = token
                .run(async {
                    polled.store(true, std::sync::atomic::Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap_err();
            assert!(err.is_cancelled());
            assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
        }

        #[tokio::test]
        async fn run_aborts_pending_future() {
            let token = CancelToken::new();
            let trip = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                trip.cancel();
            });
            let err = token
                .run(futures::future::pending::<Result<()>>())
                .await
                .unwrap_err();
            assert!(err.is_cancelled());
        }
    }

    mod slot {
        use super::*;

        #[test]
        fn cancel_trips_snapshot_and_installs_fresh_token() {
            let slot = CancelSlot::new();
            let before = slot.current();

            slot.cancel();
            let after = slot.current();

            assert!(before.is_cancelled());
            assert!(!after.is_cancelled());
            assert_eq!(after.generation(), before.generation() + 1);
        }

        #[test]
        fn repeated_cancel_is_safe() {
            let slot = CancelSlot::new();
            slot.cancel();
            slot.cancel();
            slot.cancel();
            assert!(!slot.current().is_cancelled());
            assert_eq!(slot.current().generation(), 3);
        }

        #[test]
        fn snapshots_taken_after_cancel_are_unaffected_by_it() {
            let slot = CancelSlot::new();
            slot.cancel();
            let later = slot.current();
            assert!(!later.is_cancelled());

            slot.cancel();
            assert!(later.is_cancelled());
        }
    }
}
