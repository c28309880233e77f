//! Slack bot notification sink.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use watchkeep_config::SlackSettings;

use crate::Error;
use crate::Notification;
use crate::Result;
use crate::Sink;

/// The Slack Web API endpoint used to post chat messages.
const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Sends notifications to a Slack channel via `chat.postMessage`.
pub struct SlackSink {
    settings: SlackSettings,
    client: Client,
}

impl SlackSink {
    /// Creates a new [`SlackSink`] from its settings.
    pub fn new(settings: SlackSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Sink for SlackSink {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let token = self
            .settings
            .bot_token
            .as_deref()
            .ok_or(Error::MissingSetting("slack", "SLACK_BOT_TOKEN"))?;
        let channel = self
            .settings
            .channel
            .as_deref()
            .ok_or(Error::MissingSetting("slack", "SLACK_CHANNEL_NAME"))?;

        let response = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(token)
            .json(&json!({
                "channel": channel,
                "text": format!("{}\n{}", notification.title, notification.body),
            }))
            .send()
            .await?;

        debug!("slack response status: {}", response.status());

        Ok(())
    }
}
