//! Cron schedule validation.

use std::str::FromStr;

use tracing::warn;

/// The default cron expression used when none is configured.
///
/// Five fields, matching the conventional crontab format the original
/// scheduler accepted; [`Schedule::parsed`] normalizes this to the `cron`
/// crate's mandatory six-field (seconds-first) form.
pub const DEFAULT_SCHEDULE: &str = "0 0 * * *";

/// A raw cron expression, together with whether it was accepted as viable
/// for scheduled mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    /// The raw cron expression as configured.
    expression: String,
}

impl Schedule {
    /// Wraps a raw cron expression.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Returns the raw expression string.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Attempts to parse the expression with the `cron` crate.
    ///
    /// A conventional 5-field crontab expression (the format the original
    /// scheduler and SPEC_FULL.md's configuration table both document) is
    /// normalized to the `cron` crate's mandatory 6-field seconds-first form
    /// by prepending a `0` seconds field before parsing. A 6-field
    /// expression is passed through unchanged.
    ///
    /// An invalid expression degrades to one-shot mode rather than
    /// crashing the process; callers should log a warning and fall back.
    pub fn parsed(&self) -> Option<cron::Schedule> {
        let normalized = normalize(&self.expression);
        match cron::Schedule::from_str(&normalized) {
            Ok(schedule) => Some(schedule),
            Err(err) => {
                warn!(
                    "invalid cron expression `{}`: {err}; falling back to one-shot mode",
                    self.expression
                );
                None
            }
        }
    }

    /// Returns `true` if the expression is usable for scheduled mode.
    pub fn is_viable(&self) -> bool {
        self.parsed().is_some()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEDULE)
    }
}

/// Prepends a `0` seconds field to a 5-field crontab expression so it is
/// accepted by the `cron` crate's 6-field parser. Expressions with any
/// other field count are returned unchanged, and left to fail parsing with
/// the crate's own error message.
fn normalize(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_viable() {
        assert!(Schedule::default().is_viable());
    }

    #[test]
    fn every_five_minutes_is_viable() {
        assert!(Schedule::new("0 */5 * * * *").is_viable());
    }

    #[test]
    fn garbage_expression_is_not_viable() {
        assert!(!Schedule::new("not a cron expression").is_viable());
    }

    #[test]
    fn five_field_expression_is_normalized_and_viable() {
        assert!(Schedule::new("*/5 * * * *").is_viable());
    }

    #[test]
    fn five_field_default_is_viable() {
        assert_eq!(DEFAULT_SCHEDULE.split_whitespace().count(), 5);
        assert!(Schedule::default().is_viable());
    }

    #[test]
    fn normalize_prepends_seconds_field_to_five_field_expressions() {
        assert_eq!(normalize("*/5 * * * *"), "0 */5 * * * *");
        assert_eq!(normalize("  */5 * * * *  "), "0 */5 * * * *");
    }

    #[test]
    fn normalize_leaves_six_field_expressions_unchanged() {
        assert_eq!(normalize("0 */5 * * * *"), "0 */5 * * * *");
    }
}
