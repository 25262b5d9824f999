// ── Outcome notifications ──
//
// Every remote operation reports its outcome exactly once on a broadcast
// channel. Presentation layers subscribe and render them however they
// like (toast, status line, stderr).

use std::fmt;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

const NOTIFICATION_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub(crate) struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub(crate) fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "operation succeeded");
        self.publish(NotificationLevel::Success, message);
    }

    pub(crate) fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "operation failed");
        self.publish(NotificationLevel::Error, message);
    }

    fn publish(&self, level: NotificationLevel, message: String) {
        // No subscribers is fine: the outcome is still logged.
        let _ = self.tx.send(Notification { level, message });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_in_order() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.success("Rule created");
        notifier.error("Apply failed: boom");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.level, NotificationLevel::Success);
        assert_eq!(first.to_string(), "Rule created");
        assert!(rx.try_recv().unwrap().is_error());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        Notifier::new().error("nobody listening");
    }
}
