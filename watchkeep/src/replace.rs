//! The replacement engine (C4): recreates a single stale container in place.

use std::time::Duration;

use tracing::debug;
use tracing::info;
use watchkeep_runtime::ContainerRef;
use watchkeep_runtime::ContainerRuntime;
use watchkeep_runtime::ContainerSpec;

use crate::report::FailedReplacement;
use crate::report::FailureStage;

/// The grace period given to a container to shut down cleanly before the
/// runtime forcibly kills it.
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Replaces `container` with a newly-created container running the same
/// image reference (already pulled to its current digest by the caller's
/// classification step, or pulled fresh here — see step 1 below).
///
/// Proceeds through the stages documented in SPEC_FULL.md §4.4: snapshot is
/// assumed already captured by the caller via `runtime.inspect`; this
/// function performs pull, stop, remove, create, start, and any extra
/// network connections, stopping at (and reporting) the first failing
/// stage.
pub async fn replace(
    runtime: &dyn ContainerRuntime,
    container: &ContainerRef,
) -> Result<ContainerRef, FailedReplacement> {
    let fail = |stage: FailureStage, error: String| FailedReplacement {
        container: container.clone(),
        stage,
        error,
    };

    let attrs = runtime
        .inspect(&container.id)
        .await
        .map_err(|err| fail(FailureStage::Snapshot, err.to_string()))?;

    debug!("pulling image `{}` for `{}`", attrs.image, container.name);
    runtime
        .pull(&attrs.image)
        .await
        .map_err(|err| fail(FailureStage::Pull, err.to_string()))?;

    debug!("stopping `{}`", container.name);
    runtime
        .stop(&container.id, STOP_GRACE_PERIOD)
        .await
        .map_err(|err| fail(FailureStage::Stop, err.to_string()))?;

    debug!("removing `{}`", container.name);
    runtime
        .remove(&container.id)
        .await
        .map_err(|err| fail(FailureStage::Remove, err.to_string()))?;

    let (spec, extra_networks) = ContainerSpec::from_attrs(&attrs, attrs.image.clone());

    debug!("creating replacement for `{}`", container.name);
    let new_id = runtime
        .create(&spec)
        .await
        .map_err(|err| fail(FailureStage::Create, err.to_string()))?;

    debug!("starting replacement for `{}`", container.name);
    runtime
        .start(&new_id)
        .await
        .map_err(|err| fail(FailureStage::Start, err.to_string()))?;

    for network in &extra_networks {
        runtime
            .network_connect(network, &new_id)
            .await
            .map_err(|err| fail(FailureStage::Connect, err.to_string()))?;
    }

    info!("replaced `{}` with `{new_id}`", container.name);

    Ok(ContainerRef {
        id: new_id,
        name: spec.name,
        image: spec.image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchkeep_runtime::ContainerAttrs;
    use watchkeep_runtime::PortBindings;
    use watchkeep_runtime::RestartPolicy;
    use watchkeep_runtime::fake::FakeRuntime;

    fn seed(runtime: &FakeRuntime) -> ContainerRef {
        let container = ContainerRef {
            id: "c1".to_string(),
            name: "web".to_string(),
            image: "nginx:1.25".to_string(),
        };
        let attrs = ContainerAttrs {
            image: "nginx:1.25".to_string(),
            name: "web".to_string(),
            cmd: None,
            env: vec!["FOO=bar".to_string()],
            binds: vec!["/data:/data".to_string()],
            port_bindings: PortBindings::default(),
            restart_policy: RestartPolicy::default(),
            networks: vec!["bridge".to_string()],
        };
        runtime.seed(container.clone(), attrs);
        container
    }

    #[tokio::test]
    async fn replaces_a_container_successfully() {
        let runtime = FakeRuntime::new();
        let container = seed(&runtime);

        let replaced = replace(&runtime, &container).await.unwrap();

        assert_eq!(replaced.name, "web");
        assert!(!runtime.contains(&container.id));
        assert!(runtime.contains(&replaced.id));
        assert_eq!(runtime.pulled.lock().unwrap().as_slice(), ["nginx:1.25"]);
    }

    #[tokio::test]
    async fn preserves_env_and_binds() {
        let runtime = FakeRuntime::new();
        let container = seed(&runtime);

        let replaced = replace(&runtime, &container).await.unwrap();
        let attrs = runtime.inspect(&replaced.id).await.unwrap();

        assert_eq!(attrs.env, vec!["FOO=bar".to_string()]);
        assert_eq!(attrs.binds, vec!["/data:/data".to_string()]);
    }
}
