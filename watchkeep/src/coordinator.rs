//! The run coordinator (C5): one end-to-end pass of filter, classify,
//! optionally replace, and notify.

use std::path::PathBuf;

use tracing::debug;
use tracing::info;
use watchkeep_config::AppConfig;
use watchkeep_notify::Dispatcher;
use watchkeep_runtime::ContainerRuntime;
use watchkeep_runtime::RegistryProber;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::comparator;
use crate::comparator::Classification;
use crate::replace;
use crate::report::RunReport;

/// Drives one full run: reload configuration, list and filter containers,
/// classify each, optionally replace stale ones, and dispatch a report.
pub struct Coordinator {
    /// Where [`AppConfig`] is (re-)loaded from at the top of each run.
    config_path: PathBuf,
    /// The container runtime adapter.
    runtime: Box<dyn ContainerRuntime>,
    /// The registry digest prober.
    prober: Box<dyn RegistryProber>,
    /// The time source used to stamp each [`RunReport`].
    clock: Box<dyn Clock>,
}

impl Coordinator {
    /// Creates a new [`Coordinator`] using the system clock.
    pub fn new(
        config_path: impl Into<PathBuf>,
        runtime: Box<dyn ContainerRuntime>,
        prober: Box<dyn RegistryProber>,
    ) -> Self {
        Self::with_clock(config_path, runtime, prober, Box::new(SystemClock))
    }

    /// Creates a new [`Coordinator`] with an injected clock, for
    /// deterministic tests.
    pub fn with_clock(
        config_path: impl Into<PathBuf>,
        runtime: Box<dyn ContainerRuntime>,
        prober: Box<dyn RegistryProber>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            runtime,
            prober,
            clock,
        }
    }

    /// Runs one complete pass, producing a [`RunReport`] and dispatching it
    /// to the sinks configured at the time of the run.
    pub async fn run_once(&self) -> anyhow::Result<RunReport> {
        let config = AppConfig::load(&self.config_path)?;
        info!("starting run (auto_update = {})", config.auto_update());

        let mut report = RunReport::new(self.clock.now());
        report.exclusion_policy = config.exclusion_policy().clone();

        let containers = self.runtime.list_running().await?;
        debug!("found {} running containers", containers.len());

        let eligible: Vec<_> = containers
            .into_iter()
            .filter(|c| config.exclusion_policy().should_check(&c.name, &c.image))
            .collect();

        for container in eligible {
            match comparator::classify(
                self.runtime.as_ref(),
                self.prober.as_ref(),
                &container.name,
                &container.image,
            )
            .await
            {
                Classification::UpToDate => report.up_to_date.push(container),
                Classification::UpdateAvailable => report.updates_available.push(container),
                Classification::Indeterminate => {}
            }
        }

        if config.auto_update() {
            let stale = std::mem::take(&mut report.updates_available);
            for container in stale {
                match replace::replace(self.runtime.as_ref(), &container).await {
                    Ok(_) => report.successful.push(container),
                    Err(failure) => report.failed.push(failure),
                }
            }
        }

        info!(
            "run complete: {} up to date, {} stale, {} replaced, {} failed",
            report.up_to_date.len(),
            report.successful.len() + report.failed.len(),
            report.successful.len(),
            report.failed.len()
        );

        let dispatcher = Dispatcher::from_settings(config.notifications());
        dispatcher.dispatch(&report.to_notification()).await;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchkeep_runtime::ContainerAttrs;
    use watchkeep_runtime::ContainerRef;
    use watchkeep_runtime::Digest;
    use watchkeep_runtime::PortBindings;
    use watchkeep_runtime::RestartPolicy;
    use watchkeep_runtime::fake::FakeRuntime;

    fn seed_stale(runtime: &FakeRuntime, name: &str, image: &str) {
        let container = ContainerRef {
            id: format!("{name}-id"),
            name: name.to_string(),
            image: image.to_string(),
        };
        let attrs = ContainerAttrs {
            image: image.to_string(),
            name: name.to_string(),
            cmd: None,
            env: vec![],
            binds: vec![],
            port_bindings: PortBindings::default(),
            restart_policy: RestartPolicy::default(),
            networks: vec!["bridge".to_string()],
        };
        runtime.seed(container, attrs);
        runtime.set_local_digest(image, Digest::new(&image.split(':').next().unwrap(), "sha256:old"));
        runtime.set_remote_digest(image, Digest::new(&image.split(':').next().unwrap(), "sha256:new"));
    }

    fn coordinator_with(
        runtime: std::sync::Arc<FakeRuntime>,
        config_path: &std::path::Path,
    ) -> Coordinator {
        Coordinator::new(config_path, Box::new(runtime.clone()), Box::new(runtime))
    }

    #[tokio::test]
    async fn auto_update_disabled_reports_but_does_not_replace() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("watchkeep.env");
        std::fs::write(&config_path, "AUTO_UPDATE=false\n").unwrap();

        let runtime = std::sync::Arc::new(FakeRuntime::new());
        seed_stale(&runtime, "web", "nginx:1.25");

        let coordinator = coordinator_with(runtime, &config_path);
        let report = coordinator.run_once().await.unwrap();

        assert_eq!(report.updates_available.len(), 1);
        assert!(report.successful.is_empty());
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn auto_update_enabled_replaces_stale_containers() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("watchkeep.env");
        std::fs::write(&config_path, "AUTO_UPDATE=true\n").unwrap();

        let runtime = std::sync::Arc::new(FakeRuntime::new());
        seed_stale(&runtime, "web", "nginx:1.25");

        let coordinator = coordinator_with(runtime, &config_path);
        let report = coordinator.run_once().await.unwrap();

        assert!(report.updates_available.is_empty());
        assert_eq!(report.successful.len(), 1);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn excluded_container_never_appears_in_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("watchkeep.env");
        std::fs::write(&config_path, "EXCLUDE_CONTAINERS=web\nAUTO_UPDATE=true\n").unwrap();

        let runtime = std::sync::Arc::new(FakeRuntime::new());
        seed_stale(&runtime, "web", "nginx:1.25");

        let coordinator = coordinator_with(runtime, &config_path);
        let report = coordinator.run_once().await.unwrap();

        assert!(report.up_to_date.is_empty());
        assert!(report.updates_available.is_empty());
        assert!(report.successful.is_empty());
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn empty_fleet_produces_an_all_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("watchkeep.env");
        std::fs::write(&config_path, "").unwrap();

        let runtime = std::sync::Arc::new(FakeRuntime::new());
        let coordinator = coordinator_with(runtime, &config_path);
        let report = coordinator.run_once().await.unwrap();

        assert!(report.up_to_date.is_empty());
        assert!(report.updates_available.is_empty());
        assert!(report.successful.is_empty());
        assert!(report.failed.is_empty());
    }
}
