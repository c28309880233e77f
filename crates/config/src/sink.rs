//! Per-sink notification settings.

/// Settings for the SMTP email sink.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmailSettings {
    /// Whether this sink is enabled.
    pub enabled: bool,
    /// The SMTP server URL (e.g. `smtp://smtp.example.com:587`).
    pub smtp_server_url: Option<String>,
    /// The `From` address.
    pub sender: Option<String>,
    /// The SMTP account password.
    pub password: Option<String>,
    /// The `To` address.
    pub receiver: Option<String>,
}

/// Settings for the [ntfy](https://ntfy.sh) push sink.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NtfySettings {
    /// Whether this sink is enabled.
    pub enabled: bool,
    /// The topic URL to publish to.
    pub url: Option<String>,
    /// The `Priority` header value, forwarded as-is.
    pub priority: Option<String>,
}

/// Settings for the [Gotify](https://gotify.net) push sink.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GotifySettings {
    /// Whether this sink is enabled.
    pub enabled: bool,
    /// The base server URL.
    pub url: Option<String>,
    /// The application token.
    pub app_token: Option<String>,
    /// The numeric priority, forwarded as-is.
    pub priority: Option<String>,
}

/// Settings for the Microsoft Teams webhook sink.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeamsSettings {
    /// Whether this sink is enabled.
    pub enabled: bool,
    /// The incoming webhook URL.
    pub url: Option<String>,
}

/// Settings for the Slack bot sink.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlackSettings {
    /// Whether this sink is enabled.
    pub enabled: bool,
    /// The bot OAuth token.
    pub bot_token: Option<String>,
    /// The channel name to post into.
    pub channel: Option<String>,
}

/// The full set of configured notification sinks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationSettings {
    /// Email sink settings.
    pub email: EmailSettings,
    /// ntfy sink settings.
    pub ntfy: NtfySettings,
    /// Gotify sink settings.
    pub gotify: GotifySettings,
    /// Microsoft Teams sink settings.
    pub teams: TeamsSettings,
    /// Slack sink settings.
    pub slack: SlackSettings,
}
