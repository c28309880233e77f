//! Configuration used by watchkeep.
//!
//! A few notes on the structure of this crate.
//!
//! * The configuration object is immutable and is only constructed through
//!   [`AppConfig::builder()`] or by [`AppConfig::load()`].
//! * The source format is a line-oriented `KEY=VALUE` file (see
//!   [`parser`]), not TOML — this mirrors the shell `.env` convention the
//!   tool this crate's behavior was distilled from already used, rather than
//!   introducing a new file format for operators to learn.

pub mod error;
pub mod parser;
pub mod policy;
pub mod schedule;
pub mod sink;

use std::path::Path;

use bon::Builder;
use tracing::warn;

pub use crate::error::Error;
pub use crate::error::Result;
pub use crate::policy::ExclusionPolicy;
pub use crate::schedule::Schedule;
pub use crate::sink::EmailSettings;
pub use crate::sink::GotifySettings;
pub use crate::sink::NotificationSettings;
pub use crate::sink::NtfySettings;
pub use crate::sink::SlackSettings;
pub use crate::sink::TeamsSettings;

/// The default file name looked for when no explicit path is given.
pub const FILE_NAME: &str = "watchkeep.env";

/// A global configuration object for watchkeep.
#[derive(Builder, Clone, Debug)]
#[builder(builder_type = Builder)]
pub struct AppConfig {
    /// The exclusion policy governing which containers are checked.
    #[builder(default)]
    exclusion_policy: ExclusionPolicy,

    /// Whether stale containers are automatically replaced.
    #[builder(default = false)]
    auto_update: bool,

    /// The cron schedule driving the scheduler.
    #[builder(default)]
    schedule: Schedule,

    /// The configured log level.
    #[builder(default = tracing::Level::INFO)]
    log_level: tracing::Level,

    /// The configured notification sinks.
    #[builder(default)]
    notifications: NotificationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AppConfig {
    /// Returns the exclusion policy.
    pub fn exclusion_policy(&self) -> &ExclusionPolicy {
        &self.exclusion_policy
    }

    /// Returns whether automatic replacement is enabled.
    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    /// Returns the configured schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Returns the configured log level.
    pub fn log_level(&self) -> tracing::Level {
        self.log_level
    }

    /// Returns the configured notification sinks.
    pub fn notifications(&self) -> &NotificationSettings {
        &self.notifications
    }

    /// Builds an [`AppConfig`] from an already-parsed key/value map.
    pub fn from_map(map: &indexmap::IndexMap<String, String>) -> Self {
        let exclusion_policy = ExclusionPolicy::builder()
            .excluded_names(
                map.get("EXCLUDE_CONTAINERS")
                    .map(|v| parser::split_csv(v))
                    .unwrap_or_default(),
            )
            .excluded_image_patterns(
                map.get("EXCLUDE_IMAGES")
                    .map(|v| parser::split_csv(v))
                    .unwrap_or_default(),
            )
            .build();

        let auto_update = map
            .get("AUTO_UPDATE")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let schedule = map
            .get("WATCHLESS_SCHEDULE")
            .filter(|v| !v.is_empty())
            .map(Schedule::new)
            .unwrap_or_default();

        let log_level = map
            .get("LOG_LEVEL")
            .and_then(|v| parse_log_level(v))
            .unwrap_or(tracing::Level::INFO);

        let notifications = NotificationSettings {
            email: EmailSettings {
                enabled: is_enabled(map, "EMAIL_NOTIFICATION"),
                smtp_server_url: map.get("SMTP_SERVER_URL").cloned(),
                sender: map.get("MAIL_SENDER").cloned(),
                password: map.get("SMTP_PASSWORD").cloned(),
                receiver: map.get("MAIL_RECIEVER").cloned(),
            },
            ntfy: NtfySettings {
                enabled: is_enabled(map, "NTFY_NOTIFICATION"),
                url: map.get("NTFY_URL").cloned(),
                priority: map.get("NTFY_PRIORITY_LEVEL").cloned(),
            },
            gotify: GotifySettings {
                enabled: is_enabled(map, "GOTIFY_NOTIFICATION"),
                url: map.get("GOTIFY_URL").cloned(),
                app_token: map.get("GOTIFY_APPTOKEN").cloned(),
                priority: map.get("GOTIFY_PRIORITY_LEVEL").cloned(),
            },
            teams: TeamsSettings {
                enabled: is_enabled(map, "MSTEAMS_NOTIFICATION"),
                url: map.get("MSTEAMS_URL").cloned(),
            },
            slack: SlackSettings {
                enabled: is_enabled(map, "SLACK_NOTIFICATION"),
                bot_token: map.get("SLACK_BOT_TOKEN").cloned(),
                channel: map.get("SLACK_CHANNEL_NAME").cloned(),
            },
        };

        AppConfig::builder()
            .exclusion_policy(exclusion_policy)
            .auto_update(auto_update)
            .schedule(schedule)
            .log_level(log_level)
            .notifications(notifications)
            .build()
    }

    /// Loads an [`AppConfig`] from `path`.
    ///
    /// A missing file is not an error: it is logged at warn and the defaults
    /// are used, matching the tool's historical behavior of running with an
    /// empty configuration rather than refusing to start. Any other I/O
    /// failure (e.g. a permissions error) is surfaced to the caller.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "configuration file `{}` not found; using defaults",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(err) => return Err(Error::Unreadable(err)),
        };

        Ok(Self::from_map(&parser::parse(&contents)))
    }

    /// Loads an [`AppConfig`] from the default file name in the current
    /// directory.
    pub fn load_default() -> Result<Self> {
        Self::load(FILE_NAME)
    }
}

/// Returns `true` if `map[key]` is the case-insensitive string `"true"`.
fn is_enabled(map: &indexmap::IndexMap<String, String>, key: &str) -> bool {
    map.get(key)
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Parses a log level name, falling back to `None` (callers default to
/// `INFO`) for unrecognized values.
fn parse_log_level(value: &str) -> Option<tracing::Level> {
    match value.to_uppercase().as_str() {
        "TRACE" => Some(tracing::Level::TRACE),
        "DEBUG" => Some(tracing::Level::DEBUG),
        "INFO" => Some(tracing::Level::INFO),
        "WARN" | "WARNING" => Some(tracing::Level::WARN),
        "ERROR" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_checks_everything_and_never_auto_updates() {
        let config = AppConfig::default();
        assert!(config.exclusion_policy().should_check("anything", "anything:latest"));
        assert!(!config.auto_update());
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn exclude_containers_scenario() {
        let map = parser::parse(r#"EXCLUDE_CONTAINERS="a, b ,c""#);
        let config = AppConfig::from_map(&map);
        let names = config.exclusion_policy().excluded_names();
        assert!(names.contains("a") && names.contains("b") && names.contains("c"));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let map = parser::parse("LOG_LEVEL=VERBOSE");
        let config = AppConfig::from_map(&map);
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn auto_update_is_case_insensitive() {
        let map = parser::parse("AUTO_UPDATE=True");
        assert!(AppConfig::from_map(&map).auto_update());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load("/nonexistent/path/watchkeep.env").unwrap();
        assert!(!config.auto_update());
    }

    #[test]
    fn loads_from_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchkeep.env");
        std::fs::write(&path, "AUTO_UPDATE=true\nWATCHLESS_SCHEDULE=*/5 * * * *\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert!(config.auto_update());
        assert_eq!(config.schedule().expression(), "*/5 * * * *");
        assert!(config.schedule().is_viable());
    }

    #[test]
    fn email_sink_settings_are_parsed() {
        let map = parser::parse(
            "EMAIL_NOTIFICATION=true\nSMTP_SERVER_URL=smtp://example.com\nMAIL_SENDER=a@example.com\nMAIL_RECIEVER=b@example.com\n",
        );
        let config = AppConfig::from_map(&map);
        let email = &config.notifications().email;
        assert!(email.enabled);
        assert_eq!(email.smtp_server_url.as_deref(), Some("smtp://example.com"));
        assert_eq!(email.receiver.as_deref(), Some("b@example.com"));
    }
}
