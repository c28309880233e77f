//! Microsoft Teams incoming-webhook notification sink.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use watchkeep_config::TeamsSettings;

use crate::Error;
use crate::Notification;
use crate::Result;
use crate::Sink;

/// Sends notifications to a Teams incoming webhook as a simple card.
pub struct TeamsSink {
    settings: TeamsSettings,
    client: Client,
}

impl TeamsSink {
    /// Creates a new [`TeamsSink`] from its settings.
    pub fn new(settings: TeamsSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Sink for TeamsSink {
    fn name(&self) -> &'static str {
        "teams"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let url = self
            .settings
            .url
            .as_deref()
            .ok_or(Error::MissingSetting("teams", "MSTEAMS_URL"))?;

        self.client
            .post(url)
            .json(&json!({
                "title": notification.title,
                "text": notification.body,
            }))
            .send()
            .await?;

        debug!("notification sent to MS Teams");

        Ok(())
    }
}
