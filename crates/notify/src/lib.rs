//! Notification sinks used to report [`Notification`]s to operators.
//!
//! Each sink implements [`Sink`]; [`Dispatcher`] fans a single notification
//! out to every sink enabled in configuration, continuing past individual
//! sink failures.

pub mod email;
pub mod gotify;
pub mod ntfy;
pub mod slack;
pub mod teams;

use async_trait::async_trait;
use thiserror::Error;
use tracing::error;
use watchkeep_config::NotificationSettings;

/// The logical payload handed to every sink.
#[derive(Clone, Debug)]
pub struct Notification {
    /// A short, fixed title.
    pub title: String,
    /// A human-readable, multi-section body.
    pub body: String,
}

impl Notification {
    /// Creates a new notification.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// An error sending a [`Notification`] through a specific sink.
#[derive(Error, Debug)]
pub enum Error {
    /// An error from an HTTP-based sink.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// An error from the SMTP transport.
    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// An error constructing the outgoing email message.
    #[error(transparent)]
    Email(#[from] lettre::error::Error),

    /// An address (sender/receiver) could not be parsed.
    #[error("invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),

    /// A sink was enabled but is missing a required setting.
    #[error("sink `{0}` is enabled but missing required setting `{1}`")]
    MissingSetting(&'static str, &'static str),
}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A notification destination.
#[async_trait]
pub trait Sink: Send + Sync {
    /// A short name for this sink, used in logs.
    fn name(&self) -> &'static str;

    /// Sends `notification` through this sink.
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Fans a [`Notification`] out to all enabled sinks, in configuration
/// declaration order, logging (but not propagating) individual failures.
pub struct Dispatcher {
    sinks: Vec<Box<dyn Sink>>,
}

impl Dispatcher {
    /// Builds a [`Dispatcher`] from the enabled sinks in `settings`.
    pub fn from_settings(settings: &NotificationSettings) -> Self {
        let mut sinks: Vec<Box<dyn Sink>> = Vec::new();

        if settings.email.enabled {
            sinks.push(Box::new(email::EmailSink::new(settings.email.clone())));
        }
        if settings.ntfy.enabled {
            sinks.push(Box::new(ntfy::NtfySink::new(settings.ntfy.clone())));
        }
        if settings.gotify.enabled {
            sinks.push(Box::new(gotify::GotifySink::new(settings.gotify.clone())));
        }
        if settings.teams.enabled {
            sinks.push(Box::new(teams::TeamsSink::new(settings.teams.clone())));
        }
        if settings.slack.enabled {
            sinks.push(Box::new(slack::SlackSink::new(settings.slack.clone())));
        }

        Self { sinks }
    }

    /// Dispatches `notification` to every configured sink.
    ///
    /// A failing sink is logged at error; the remaining sinks still run.
    pub async fn dispatch(&self, notification: &Notification) {
        for sink in &self.sinks {
            if let Err(err) = sink.send(notification).await {
                error!("notification sink `{}` failed: {err}", sink.name());
            }
        }
    }

    /// Returns the number of enabled sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns `true` if no sinks are enabled.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
