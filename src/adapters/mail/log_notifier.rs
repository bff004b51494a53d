//! Log-only notifier for deployments without SMTP.
//!
//! Logs each notification and keeps a copy in memory so tests can assert on what was sent.

use crate::domain::{DomainError, Notification};
use crate::ports::NotifierPort;
use std::sync::Mutex;
use tracing::info;

#[derive(Default)]
pub struct LogNotifier {
    sent: Mutex<Vec<(String, Notification)>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything "sent" so far, oldest first.
    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl NotifierPort for LogNotifier {
    async fn notify(
        &self,
        recipient: &str,
        notification: &Notification,
    ) -> Result<(), DomainError> {
        info!(
            recipient,
            subject = %notification.subject(),
            "[LOG MAILER] notification not delivered (EMAIL_HOST unset)"
        );
        if let Ok(mut guard) = self.sent.lock() {
            guard.push((recipient.to_string(), notification.clone()));
        }
        Ok(())
    }
}
