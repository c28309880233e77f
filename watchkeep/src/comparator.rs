//! The digest comparator (C3): classifies a container's image as up to date,
//! stale, or indeterminate.

use tracing::warn;
use watchkeep_runtime::ContainerRuntime;
use watchkeep_runtime::RegistryProber;

/// The classification of a single container's digest comparison.
#[derive(Debug, PartialEq, Eq)]
pub enum Classification {
    /// The local and remote digests matched.
    UpToDate,
    /// The local and remote digests differed.
    UpdateAvailable,
    /// One or both digests could not be determined; the container is
    /// skipped rather than treated as an error.
    Indeterminate,
}

/// Classifies `image` by comparing its local repo digest against the
/// current remote registry digest.
///
/// A registry or local-inspection failure is logged at warn and yields
/// [`Classification::Indeterminate`] rather than propagating — one
/// container's probe failure must not abort the run.
pub async fn classify(
    runtime: &dyn ContainerRuntime,
    prober: &dyn RegistryProber,
    container_name: &str,
    image: &str,
) -> Classification {
    let local = match runtime.local_repo_digests(image).await {
        Ok(digests) => digests.into_iter().next(),
        Err(err) => {
            warn!("failed to read local digest for `{container_name}` ({image}): {err}");
            None
        }
    };

    let Some(local) = local else {
        warn!("no local repo digest recorded for `{container_name}` ({image})");
        return Classification::Indeterminate;
    };

    let remote = match prober.remote_digest(image).await {
        Ok(digest) => Some(digest),
        Err(err) => {
            warn!("registry probe failed for `{container_name}` ({image}): {err}");
            None
        }
    };

    let Some(remote) = remote else {
        return Classification::Indeterminate;
    };

    if local == remote {
        Classification::UpToDate
    } else {
        Classification::UpdateAvailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchkeep_runtime::Digest;
    use watchkeep_runtime::fake::FakeRuntime;

    #[tokio::test]
    async fn missing_local_digest_is_indeterminate() {
        let runtime = FakeRuntime::new();
        let classification = classify(&runtime, &runtime, "web", "nginx:1.25").await;
        assert_eq!(classification, Classification::Indeterminate);
    }

    #[tokio::test]
    async fn missing_remote_digest_is_indeterminate() {
        let runtime = FakeRuntime::new();
        runtime.set_local_digest("nginx:1.25", Digest::new("nginx", "sha256:aaaa"));
        let classification = classify(&runtime, &runtime, "web", "nginx:1.25").await;
        assert_eq!(classification, Classification::Indeterminate);
    }

    #[tokio::test]
    async fn matching_digests_are_up_to_date() {
        let runtime = FakeRuntime::new();
        runtime.set_local_digest("nginx:1.25", Digest::new("nginx", "sha256:aaaa"));
        runtime.set_remote_digest("nginx:1.25", Digest::new("nginx", "sha256:aaaa"));
        let classification = classify(&runtime, &runtime, "web", "nginx:1.25").await;
        assert_eq!(classification, Classification::UpToDate);
    }

    #[tokio::test]
    async fn differing_digests_are_update_available() {
        let runtime = FakeRuntime::new();
        runtime.set_local_digest("nginx:1.25", Digest::new("nginx", "sha256:aaaa"));
        runtime.set_remote_digest("nginx:1.25", Digest::new("nginx", "sha256:bbbb"));
        let classification = classify(&runtime, &runtime, "web", "nginx:1.25").await;
        assert_eq!(classification, Classification::UpdateAvailable);
    }
}
