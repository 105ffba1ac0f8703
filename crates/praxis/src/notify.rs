//! Outbound patient notifications.
//!
//! Notifications are best-effort: the coordinator completes its bookkeeping
//! first and treats delivery failure as a warning, never as a reason to
//! roll back a booking.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::Result;

/// A message to a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient email address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Delivery channel for patient notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification.
    async fn notify(&self, notification: Notification) -> Result<()>;
}

/// A notifier that drops everything. Useful when no channel is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: Notification) -> Result<()> {
        Ok(())
    }
}

/// A notifier that records messages in memory, for tests.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications sent so far, in order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, notification: Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

#[async_trait]
impl<N: Notifier> Notifier for std::sync::Arc<N> {
    async fn notify(&self, notification: Notification) -> Result<()> {
        (**self).notify(notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_notifier_records_in_order() {
        let notifier = MemoryNotifier::new();
        for i in 0..3 {
            notifier
                .notify(Notification {
                    to: "anna@example.org".into(),
                    subject: format!("Nachricht {i}"),
                    body: "Test".into(),
                })
                .await
                .unwrap();
        }

        let sent = notifier.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].subject, "Nachricht 0");
    }
}
