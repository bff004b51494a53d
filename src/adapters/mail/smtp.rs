//! SMTP adapter. Implements NotifierPort by sending HTML mail through lettre.

use crate::domain::{DomainError, Notification};
use crate::ports::NotifierPort;
use crate::shared::config::EmailSettings;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::info;

/// SMTP mailer.
///
/// Port 465 uses implicit TLS, ports 25 and 1025 (local relays, mail catchers)
/// are plaintext, anything else negotiates STARTTLS.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &EmailSettings) -> Result<Self, DomainError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| DomainError::Notifier(format!("invalid sender '{}': {e}", settings.from)))?;

        let mut builder = match settings.port {
            465 => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| DomainError::Notifier(format!("SMTP relay setup failed: {e}")))?,
            25 | 1025 => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host),
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| DomainError::Notifier(format!("SMTP relay setup failed: {e}")))?,
        }
        .port(settings.port);

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(
                user.clone(),
                pass.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait::async_trait]
impl NotifierPort for SmtpNotifier {
    async fn notify(
        &self,
        recipient: &str,
        notification: &Notification,
    ) -> Result<(), DomainError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| DomainError::Notifier(format!("invalid recipient '{recipient}': {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject())
            .header(ContentType::TEXT_HTML)
            .body(notification.html_body())
            .map_err(|e| DomainError::Notifier(format!("message build failed: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| DomainError::Notifier(format!("SMTP send failed: {e}")))?;

        info!(recipient, subject = %notification.subject(), "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(from: &str) -> EmailSettings {
        EmailSettings {
            host: "localhost".into(),
            port: 1025,
            username: None,
            password: None,
            from: from.into(),
        }
    }

    #[tokio::test]
    async fn test_builds_plain_transport_for_local_relay() {
        assert!(SmtpNotifier::new(&settings("Desk <desk@example.com>")).is_ok());
    }

    #[tokio::test]
    async fn test_rejects_invalid_sender() {
        let err = SmtpNotifier::new(&settings("not an address")).err();
        assert!(matches!(err, Some(DomainError::Notifier(_))));
    }

    #[tokio::test]
    async fn test_rejects_invalid_recipient_before_connecting() {
        let notifier = SmtpNotifier::new(&settings("desk@example.com")).unwrap();
        let n = Notification::Upload { tasks: vec![] };
        let err = notifier.notify("nobody", &n).await.unwrap_err();
        assert!(matches!(err, DomainError::Notifier(_)));
    }
}
