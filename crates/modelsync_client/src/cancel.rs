//! Cooperative cancellation handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// A cooperative cancellation handle.
///
/// One handle is created per caller invocation; cancelling it resolves the
/// [`cancelled`](CancelHandle::cancelled) future, which the caller races
/// against the in-flight operation. Dropping the losing branch of that
/// race is what actually abandons the underlying request.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<CancelShared>,
}

struct CancelShared {
    flagged: AtomicBool,
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Creates a fresh, uncancelled handle.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(CancelShared {
                flagged: AtomicBool::new(false),
                tx,
            }),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.flagged.store(true, Ordering::SeqCst);
        self.inner.tx.send_replace(true);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.flagged.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        let mut rx = self.inner.tx.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            // The sender lives in `self.inner`, so `changed` cannot fail
            // while we are polling it.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Returns true if both handles refer to the same invocation.
    pub fn same(&self, other: &CancelHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_resolves_waiters() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());

        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.cancel();
        tokio::time::timeout(Duration::from_millis(100), task)
            .await
            .unwrap()
            .unwrap();
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn already_cancelled_resolves_immediately() {
        let handle = CancelHandle::new();
        handle.cancel();
        handle.cancelled().await;
    }

    #[test]
    fn identity_comparison() {
        let a = CancelHandle::new();
        let b = a.clone();
        let c = CancelHandle::new();
        assert!(a.same(&b));
        assert!(!a.same(&c));
    }
}
