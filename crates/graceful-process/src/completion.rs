//! One-shot, multi-reader completion signal
//!
//! The reaper owns the only [`CompletionSender`] and consumes it when it publishes the
//! terminal result, so the slot can be written at most once. Any number of
//! [`CompletionReceiver`] clones can wait on it; once fired the value stays readable.

use std::io;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{ProcessError, Result};
use crate::status::ProcessState;

/// Terminal result published by the reaper
pub(crate) type Completion = std::result::Result<ProcessState, Arc<io::Error>>;

/// Create a linked sender/receiver pair
pub(crate) fn channel() -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = watch::channel(None);
    (CompletionSender { tx }, CompletionReceiver { rx })
}

/// Write side, held by the reaper
pub(crate) struct CompletionSender {
    tx: watch::Sender<Option<Completion>>,
}

impl CompletionSender {
    /// Publish the terminal result and wake every waiter
    pub(crate) fn complete(self, completion: Completion) {
        // send_replace stores the value even when no receiver is currently alive
        self.tx.send_replace(Some(completion));
    }
}

/// Read side, cloned for every waiter
#[derive(Clone)]
pub(crate) struct CompletionReceiver {
    rx: watch::Receiver<Option<Completion>>,
}

impl CompletionReceiver {
    /// Terminal result if it has already been published
    pub(crate) fn peek(&self) -> Option<Completion> {
        self.rx.borrow().clone()
    }

    /// Suspend until the terminal result is published
    pub(crate) async fn recv(&self) -> Result<Completion> {
        let mut rx = self.rx.clone();
        let value = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| ProcessError::ReaperLost)?;

        value.clone().ok_or(ProcessError::ReaperLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Termination;
    use std::time::Duration;

    fn exited(code: i32) -> Completion {
        Ok(ProcessState::new(1, Termination::Exited(code)))
    }

    #[tokio::test]
    async fn test_peek_before_and_after_complete() {
        let (tx, rx) = channel();
        assert!(rx.peek().is_none());

        tx.complete(exited(3));
        assert_eq!(rx.peek().unwrap().unwrap().code(), Some(3));
    }

    #[tokio::test]
    async fn test_value_survives_sender_drop() {
        let (tx, rx) = channel();
        tx.complete(exited(0));

        // Sender is gone; every later read still sees the value.
        for _ in 0..3 {
            let state = rx.recv().await.unwrap().unwrap();
            assert!(state.success());
        }
    }

    #[tokio::test]
    async fn test_all_waiters_wake() {
        let (tx, rx) = channel();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let rx = rx.clone();
                tokio::spawn(async move { rx.recv().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.complete(exited(5));

        for waiter in waiters {
            let state = waiter.await.unwrap().unwrap().unwrap();
            assert_eq!(state.code(), Some(5));
        }
    }

    #[tokio::test]
    async fn test_dropped_sender_without_value() {
        let (tx, rx) = channel();
        drop(tx);

        assert!(matches!(rx.recv().await, Err(ProcessError::ReaperLost)));
    }
}
