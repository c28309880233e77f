//! [Gotify](https://gotify.net) push notification sink.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use watchkeep_config::GotifySettings;

use crate::Error;
use crate::Notification;
use crate::Result;
use crate::Sink;

/// The Gotify priority used when none is configured (mid-range).
const DEFAULT_PRIORITY: i64 = 5;

/// Sends notifications to a Gotify server's message endpoint.
pub struct GotifySink {
    settings: GotifySettings,
    client: Client,
}

impl GotifySink {
    /// Creates a new [`GotifySink`] from its settings.
    pub fn new(settings: GotifySettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Sink for GotifySink {
    fn name(&self) -> &'static str {
        "gotify"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let base_url = self
            .settings
            .url
            .as_deref()
            .ok_or(Error::MissingSetting("gotify", "GOTIFY_URL"))?;
        let token = self
            .settings
            .app_token
            .as_deref()
            .ok_or(Error::MissingSetting("gotify", "GOTIFY_APPTOKEN"))?;

        let priority = self
            .settings
            .priority
            .as_deref()
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(DEFAULT_PRIORITY);

        let url = format!("{base_url}/message?token={token}");

        self.client
            .post(&url)
            .json(&json!({
                "message": notification.body,
                "priority": priority,
                "title": notification.title,
            }))
            .send()
            .await?;

        debug!("notification sent to gotify");

        Ok(())
    }
}
