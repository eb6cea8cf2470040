//! Single-slot mailbox connecting external human input to the turn loop.

use crate::engine::PlayerAction;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// One slot per human seat. Writers overwrite; the turn loop drains with a
/// deadline and treats an empty read as a timed-out turn.
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<Option<PlayerAction>>,
    notify: Notify,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit an action, replacing any undelivered one.
    pub fn offer(&self, action: PlayerAction) {
        *self.slot.lock().unwrap() = Some(action);
        self.notify.notify_one();
    }

    pub fn take(&self) -> Option<PlayerAction> {
        self.slot.lock().unwrap().take()
    }

    /// Discard anything stale, e.g. at the start of a new turn.
    pub fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }

    /// Wait up to `deadline` for an action. `None` means the turn timed out.
    pub async fn recv_timeout(&self, deadline: Duration) -> Option<PlayerAction> {
        tokio::time::timeout(deadline, async {
            loop {
                let notified = self.notify.notified();
                if let Some(action) = self.take() {
                    return action;
                }
                notified.await;
            }
        })
        .await
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offer_then_receive() {
        let mailbox = Mailbox::new();
        mailbox.offer(PlayerAction::Call);
        let received = mailbox.recv_timeout(Duration::from_millis(50)).await;
        assert_eq!(received, Some(PlayerAction::Call));
    }

    #[tokio::test]
    async fn test_timeout_returns_none() {
        let mailbox = Mailbox::new();
        let received = mailbox.recv_timeout(Duration::from_millis(20)).await;
        assert_eq!(received, None);
    }

    #[tokio::test]
    async fn test_offer_wakes_waiting_reader() {
        let mailbox = std::sync::Arc::new(Mailbox::new());
        let reader = mailbox.clone();
        let handle =
            tokio::spawn(async move { reader.recv_timeout(Duration::from_secs(5)).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        mailbox.offer(PlayerAction::Fold);

        assert_eq!(handle.await.unwrap(), Some(PlayerAction::Fold));
    }

    #[tokio::test]
    async fn test_second_offer_overwrites_first() {
        let mailbox = Mailbox::new();
        mailbox.offer(PlayerAction::Fold);
        mailbox.offer(PlayerAction::Raise(60));
        assert_eq!(mailbox.take(), Some(PlayerAction::Raise(60)));
        assert_eq!(mailbox.take(), None);
    }
}
