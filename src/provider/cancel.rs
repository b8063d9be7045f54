//! Cancellation Token
//!
//! One-shot cancellation source/signal pair. The provider owns the
//! [`CancellationHandle`] of the fetch it started; the fetcher receives a
//! [`CancellationSignal`] it can poll or await to abort downstream work.

use std::sync::Arc;
use tokio::sync::watch;

/// State of a fetch's cancellation handle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancelState {
    /// Fetch not settled yet
    Pending,
    /// Fetch settled on its own (success or failure)
    Settled,
    /// Fetch was cancelled with the given reason
    Cancelled(Arc<str>),
}

/// Owner side of a cancellation token
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<CancelState>,
}

/// Observer side handed to the fetch function
#[derive(Clone, Debug)]
pub struct CancellationSignal {
    rx: watch::Receiver<CancelState>,
}

impl CancellationHandle {
    /// Create a pending handle
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CancelState::Pending);
        Self { tx }
    }

    /// Get a signal observing this handle
    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Cancel with a reason. Returns false if already settled or cancelled.
    pub fn cancel(&self, reason: &str) -> bool {
        self.transition(CancelState::Cancelled(reason.into()))
    }

    /// Mark the fetch as settled. Returns false if already settled or cancelled.
    pub fn settle(&self) -> bool {
        self.transition(CancelState::Settled)
    }

    /// Current state
    pub fn state(&self) -> CancelState {
        self.tx.borrow().clone()
    }

    /// Whether neither `cancel` nor `settle` has happened
    pub fn is_pending(&self) -> bool {
        *self.tx.borrow() == CancelState::Pending
    }

    fn transition(&self, next: CancelState) -> bool {
        self.tx.send_if_modified(|state| {
            if *state != CancelState::Pending {
                return false;
            }
            *state = next;
            true
        })
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationSignal {
    /// Whether the owning handle was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(*self.rx.borrow(), CancelState::Cancelled(_))
    }

    /// Cancellation reason, if cancelled
    pub fn reason(&self) -> Option<Arc<str>> {
        match &*self.rx.borrow() {
            CancelState::Cancelled(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Wait until the handle is cancelled and return the reason.
    ///
    /// Never resolves if the handle settles or is dropped without cancelling.
    pub async fn cancelled(&self) -> Arc<str> {
        let mut rx = self.rx.clone();
        let reason = match rx
            .wait_for(|state| matches!(state, CancelState::Cancelled(_)))
            .await
        {
            Ok(state) => match &*state {
                CancelState::Cancelled(reason) => Some(reason.clone()),
                _ => None,
            },
            Err(_) => None,
        };

        match reason {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_one_shot() {
        let handle = CancellationHandle::new();
        let signal = handle.signal();
        assert!(handle.is_pending());
        assert!(!signal.is_cancelled());

        assert!(handle.cancel("superseded"));
        assert!(!handle.cancel("user cancel"));
        assert!(!handle.settle());
        assert!(signal.is_cancelled());
        assert_eq!(signal.reason().as_deref(), Some("superseded"));
    }

    #[test]
    fn test_settle_blocks_cancel() {
        let handle = CancellationHandle::new();
        let signal = handle.signal();
        assert!(handle.settle());
        assert!(!handle.cancel("superseded"));
        assert_eq!(handle.state(), CancelState::Settled);
        assert!(!signal.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_future_resolves_with_reason() {
        let handle = CancellationHandle::new();
        let signal = handle.signal();

        let waiter = tokio::spawn(async move { signal.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel("superseded");

        let reason = waiter.await.expect("join");
        assert_eq!(&*reason, "superseded");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_future_pends_after_drop() {
        let handle = CancellationHandle::new();
        let signal = handle.signal();
        drop(handle);

        let waited =
            tokio::time::timeout(Duration::from_millis(50), signal.cancelled()).await;
        assert!(waited.is_err());
    }
}
