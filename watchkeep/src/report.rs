//! The structured summary produced by one run of the coordinator.

use chrono::DateTime;
use chrono::Utc;
use watchkeep_config::ExclusionPolicy;
use watchkeep_runtime::ContainerRef;

/// Why a single container's replacement attempt failed, tagged with the
/// last state-machine stage it completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureStage {
    /// Failed while inspecting the existing container to snapshot it.
    Snapshot,
    /// Failed while pulling the new image.
    Pull,
    /// Failed while stopping the existing container.
    Stop,
    /// Failed while removing the existing container.
    Remove,
    /// Failed while creating the replacement container.
    Create,
    /// Failed while starting the replacement container.
    Start,
    /// Failed while attaching an additional network.
    Connect,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Snapshot => "snapshot",
            Self::Pull => "pull",
            Self::Stop => "stop",
            Self::Remove => "remove",
            Self::Create => "create",
            Self::Start => "start",
            Self::Connect => "connect",
        };
        f.write_str(name)
    }
}

/// A container that failed to replace, with the stage it failed at.
#[derive(Clone, Debug)]
pub struct FailedReplacement {
    /// The container that failed to replace.
    pub container: ContainerRef,
    /// The last state-machine stage that was attempted.
    pub stage: FailureStage,
    /// The error message captured at that stage.
    pub error: String,
}

/// The outcome of one scheduled (or one-shot) run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// When this run started.
    pub timestamp: DateTime<Utc>,

    /// Containers whose local and remote digests matched.
    pub up_to_date: Vec<ContainerRef>,

    /// Containers whose local and remote digests differed.
    pub updates_available: Vec<ContainerRef>,

    /// Containers successfully replaced.
    pub successful: Vec<ContainerRef>,

    /// Containers whose replacement failed.
    pub failed: Vec<FailedReplacement>,

    /// The exclusion policy active during this run, for the report body.
    pub exclusion_policy: ExclusionPolicy,
}

impl RunReport {
    /// Creates an empty report timestamped at `timestamp`.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            up_to_date: Vec::new(),
            updates_available: Vec::new(),
            successful: Vec::new(),
            failed: Vec::new(),
            exclusion_policy: ExclusionPolicy::default(),
        }
    }

    /// Renders this report as a human-readable notification title/body pair.
    pub fn to_notification(&self) -> watchkeep_notify::Notification {
        let title = "watchkeep run summary".to_string();

        let mut sections = Vec::new();
        sections.push(format!(
            "Run at: {}",
            self.timestamp.to_rfc3339()
        ));
        sections.push(format!("Up to date: {}", self.up_to_date.len()));
        sections.push(format!(
            "Updates available: {}",
            self.updates_available.len()
        ));
        sections.push(format!("Replaced: {}", self.successful.len()));
        sections.push(format!("Failed: {}", self.failed.len()));

        if !self.updates_available.is_empty() {
            sections.push(String::new());
            sections.push("Stale containers:".to_string());
            for container in &self.updates_available {
                sections.push(format!("  - {} ({})", container.name, container.image));
            }
        }

        if !self.failed.is_empty() {
            sections.push(String::new());
            sections.push("Failed replacements:".to_string());
            for failure in &self.failed {
                sections.push(format!(
                    "  - {} (at {}): {}",
                    failure.container.name, failure.stage, failure.error
                ));
            }
        }

        watchkeep_notify::Notification::new(title, sections.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(name: &str) -> ContainerRef {
        ContainerRef {
            id: format!("{name}-id"),
            name: name.to_string(),
            image: format!("{name}:latest"),
        }
    }

    fn timestamp() -> DateTime<Utc> {
        "2026-01-01T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn empty_report_renders_zeroed_counts() {
        let report = RunReport::new(timestamp());
        let notification = report.to_notification();
        assert!(notification.body.contains("Up to date: 0"));
        assert!(notification.body.contains("Replaced: 0"));
    }

    #[test]
    fn report_renders_its_timestamp() {
        let report = RunReport::new(timestamp());
        let notification = report.to_notification();
        assert!(notification.body.contains("2026-01-01T10:00:00+00:00"));
    }

    #[test]
    fn stale_containers_are_listed_by_name() {
        let mut report = RunReport::new(timestamp());
        report.updates_available.push(container("web"));
        let notification = report.to_notification();
        assert!(notification.body.contains("web (web:latest)"));
    }
}
