//! [ntfy](https://ntfy.sh) push notification sink.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use watchkeep_config::NtfySettings;

use crate::Error;
use crate::Notification;
use crate::Result;
use crate::Sink;

/// Sends notifications to a configured ntfy topic URL.
pub struct NtfySink {
    settings: NtfySettings,
    client: Client,
}

impl NtfySink {
    /// Creates a new [`NtfySink`] from its settings.
    pub fn new(settings: NtfySettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Sink for NtfySink {
    fn name(&self) -> &'static str {
        "ntfy"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let url = self
            .settings
            .url
            .as_deref()
            .ok_or(Error::MissingSetting("ntfy", "NTFY_URL"))?;

        let mut request = self
            .client
            .post(url)
            .header("Title", notification.title.clone())
            .body(notification.body.clone());

        if let Some(priority) = &self.settings.priority {
            request = request.header("Priority", priority.clone());
        }

        let response = request.send().await?;
        debug!("ntfy http status code: {}", response.status());

        Ok(())
    }
}
