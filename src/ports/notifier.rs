//! Notifier outbound port. Deliver task notifications (e.g. SMTP mail).

use crate::domain::{DomainError, Notification};

/// Port for delivering a notification to one recipient.
///
/// Implemented by adapters (SMTP, log-only). Callers treat failures as
/// non-fatal: the triggering request still succeeds.
#[async_trait::async_trait]
pub trait NotifierPort: Send + Sync {
    /// Send `notification` to `recipient` (an email address).
    ///
    /// # Errors
    /// Returns `DomainError::Notifier` if delivery fails.
    async fn notify(&self, recipient: &str, notification: &Notification)
    -> Result<(), DomainError>;
}
