//! SMTP email notification sink.

use async_trait::async_trait;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;
use lettre::transport::smtp::AsyncSmtpTransport;
use lettre::transport::smtp::authentication::Credentials;
use tracing::debug;
use watchkeep_config::EmailSettings;

use crate::Error;
use crate::Notification;
use crate::Result;
use crate::Sink;

/// Sends notifications over SMTP using implicit TLS (SMTPS).
pub struct EmailSink {
    settings: EmailSettings,
}

impl EmailSink {
    /// Creates a new [`EmailSink`] from its settings.
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Sink for EmailSink {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let server = self
            .settings
            .smtp_server_url
            .as_deref()
            .ok_or(Error::MissingSetting("email", "SMTP_SERVER_URL"))?;
        let sender = self
            .settings
            .sender
            .as_deref()
            .ok_or(Error::MissingSetting("email", "MAIL_SENDER"))?;
        let password = self
            .settings
            .password
            .as_deref()
            .ok_or(Error::MissingSetting("email", "SMTP_PASSWORD"))?;
        let receiver = self
            .settings
            .receiver
            .as_deref()
            .ok_or(Error::MissingSetting("email", "MAIL_RECIEVER"))?;

        let message = Message::builder()
            .from(sender.parse()?)
            .to(receiver.parse()?)
            .subject(notification.title.clone())
            .body(notification.body.clone())?;

        let credentials = Credentials::new(sender.to_string(), password.to_string());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(server)?
            .credentials(credentials)
            .build();

        mailer.send(message).await?;
        debug!("notification sent via email to `{receiver}`");

        Ok(())
    }
}
