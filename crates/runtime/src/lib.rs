//! A container runtime adapter backed by [`bollard`].
//!
//! This crate exposes the minimal capability surface the update-checking
//! engine needs (list, inspect, registry probe, pull, stop, remove, create,
//! start, network-connect) behind the [`ContainerRuntime`] trait, so that the
//! engine can be exercised against an in-memory fake without a live daemon.

pub mod digest;
pub mod docker;
pub mod registry;
pub mod types;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

use async_trait::async_trait;
use thiserror::Error;

pub use crate::digest::Digest;
pub use crate::digest::ImageRef;
pub use crate::docker::Docker;
pub use crate::registry::HttpRegistryProber;
pub use crate::registry::RegistryProber;
pub use crate::types::Bind;
pub use crate::types::ContainerAttrs;
pub use crate::types::ContainerRef;
pub use crate::types::ContainerSpec;
pub use crate::types::PortBinding;
pub use crate::types::PortBindings;
pub use crate::types::RestartPolicy;

/// A global error within this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The container runtime could not be reached at all.
    ///
    /// This is the only error in this crate that callers should treat as
    /// fatal; every other variant describes a per-container or per-image
    /// failure that should be recorded and skipped.
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// An error from [`bollard`].
    #[error(transparent)]
    Docker(#[from] bollard::errors::Error),

    /// An error performing a registry probe over HTTP.
    #[error(transparent)]
    Registry(#[from] reqwest::Error),

    /// A required field was missing on an inspected container.
    #[error("container `{0}` is missing expected field `{1}`")]
    MissingField(String, &'static str),

    /// A catch-all for conditions not covered by a more specific variant.
    #[error("{0}")]
    Message(String),
}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The capability surface the update-checking engine needs from a container
/// runtime.
///
/// The default implementation, [`Docker`], is backed by a local Docker-
/// compatible daemon via `bollard`. Tests use [`fake::FakeRuntime`] instead.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Lists all currently running containers.
    async fn list_running(&self) -> Result<Vec<ContainerRef>>;

    /// Inspects a container, returning the fields needed to snapshot and
    /// later recreate it.
    async fn inspect(&self, id: &str) -> Result<ContainerAttrs>;

    /// Returns the local repo digests recorded for `image`, in the order
    /// the runtime reports them. Empty if the image is not present locally.
    async fn local_repo_digests(&self, image: &str) -> Result<Vec<Digest>>;

    /// Pulls `image` from its remote repository.
    async fn pull(&self, image: &str) -> Result<()>;

    /// Stops a running container, allowing up to `grace_period` for a clean
    /// shutdown before the runtime forcibly kills it.
    async fn stop(&self, id: &str, grace_period: std::time::Duration) -> Result<()>;

    /// Removes a (stopped) container.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Creates a new container from `spec`, returning its id.
    async fn create(&self, spec: &ContainerSpec) -> Result<String>;

    /// Starts a created container.
    async fn start(&self, id: &str) -> Result<()>;

    /// Attaches a running container to an additional network.
    async fn network_connect(&self, network: &str, id: &str) -> Result<()>;
}

#[async_trait]
impl<T: ContainerRuntime + ?Sized> ContainerRuntime for std::sync::Arc<T> {
    async fn list_running(&self) -> Result<Vec<ContainerRef>> {
        (**self).list_running().await
    }

    async fn inspect(&self, id: &str) -> Result<ContainerAttrs> {
        (**self).inspect(id).await
    }

    async fn local_repo_digests(&self, image: &str) -> Result<Vec<Digest>> {
        (**self).local_repo_digests(image).await
    }

    async fn pull(&self, image: &str) -> Result<()> {
        (**self).pull(image).await
    }

    async fn stop(&self, id: &str, grace_period: std::time::Duration) -> Result<()> {
        (**self).stop(id, grace_period).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        (**self).remove(id).await
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<String> {
        (**self).create(spec).await
    }

    async fn start(&self, id: &str) -> Result<()> {
        (**self).start(id).await
    }

    async fn network_connect(&self, network: &str, id: &str) -> Result<()> {
        (**self).network_connect(network, id).await
    }
}
