//! core::cancel
//!
//! Cooperative cancellation shared across one command run.
//!
//! A single [`CancelToken`] is created by the factory and cloned into the
//! transport, resolver, hydrator and pipeline. Cancelling stops new work
//! from being scheduled; requests already on the wire run to completion and
//! their results are discarded.

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable cancellation flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Signal cancellation to every clone. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as any clone of the token, so this only
        // errors if every token was dropped, in which case nothing is waiting.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        token.cancel();
        handle.await.unwrap();
    }
}
