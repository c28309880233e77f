//! An in-memory [`ContainerRuntime`] fake for tests that do not require a
//! live daemon.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::ContainerAttrs;
use crate::ContainerRef;
use crate::ContainerRuntime;
use crate::ContainerSpec;
use crate::Digest;
use crate::Error;
use crate::RegistryProber;
use crate::Result;

/// One container tracked by [`FakeRuntime`].
#[derive(Clone, Debug)]
pub struct FakeContainer {
    /// The container reference.
    pub container: ContainerRef,

    /// The attributes returned by `inspect`.
    pub attrs: ContainerAttrs,
}

/// An in-memory fleet used to drive the engine without Docker.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    /// Containers keyed by id, guarded by a `Mutex` since [`ContainerRuntime`]
    /// requires `Send + Sync` trait objects.
    containers: Mutex<HashMap<String, FakeContainer>>,

    /// Local repo digests keyed by image reference.
    local_digests: Mutex<HashMap<String, Vec<Digest>>>,

    /// Remote digests keyed by image reference, used by a paired fake
    /// registry prober in engine-level tests.
    pub remote_digests: Mutex<HashMap<String, Digest>>,

    /// Images that have been pulled, for assertions.
    pub pulled: Mutex<Vec<String>>,

    /// An id counter for newly created containers.
    next_id: Mutex<u64>,
}

impl FakeRuntime {
    /// Creates an empty fake runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a running container.
    pub fn seed(&self, container: ContainerRef, attrs: ContainerAttrs) {
        self.containers.lock().unwrap().insert(
            container.id.clone(),
            FakeContainer { container, attrs },
        );
    }

    /// Sets the local repo digests reported for `image`.
    pub fn set_local_digest(&self, image: &str, digest: Digest) {
        self.local_digests
            .lock()
            .unwrap()
            .insert(image.to_string(), vec![digest]);
    }

    /// Sets the remote digest this fake's paired [`RegistryProber`] impl
    /// reports for `image`.
    pub fn set_remote_digest(&self, image: &str, digest: Digest) {
        self.remote_digests
            .lock()
            .unwrap()
            .insert(image.to_string(), digest);
    }

    /// Returns `true` if `id` is currently tracked (i.e. was not removed).
    pub fn contains(&self, id: &str) -> bool {
        self.containers.lock().unwrap().contains_key(id)
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_running(&self) -> Result<Vec<ContainerRef>> {
        Ok(self
            .containers
            .lock()
            .unwrap()
            .values()
            .map(|c| c.container.clone())
            .collect())
    }

    async fn inspect(&self, id: &str) -> Result<ContainerAttrs> {
        self.containers
            .lock()
            .unwrap()
            .get(id)
            .map(|c| c.attrs.clone())
            .ok_or_else(|| Error::Message(format!("no such container: {id}")))
    }

    async fn local_repo_digests(&self, image: &str) -> Result<Vec<Digest>> {
        Ok(self
            .local_digests
            .lock()
            .unwrap()
            .get(image)
            .cloned()
            .unwrap_or_default())
    }

    async fn pull(&self, image: &str) -> Result<()> {
        self.pulled.lock().unwrap().push(image.to_string());
        Ok(())
    }

    async fn stop(&self, _id: &str, _grace_period: Duration) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.containers.lock().unwrap().remove(id);
        Ok(())
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<String> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = format!("fake-{}", *next_id);

        let attrs = ContainerAttrs {
            image: spec.image.clone(),
            name: spec.name.clone(),
            cmd: spec.cmd.clone(),
            env: spec.env.clone(),
            binds: spec.binds.clone(),
            port_bindings: spec.port_bindings.clone(),
            restart_policy: spec.restart_policy.clone(),
            networks: spec.primary_network.iter().cloned().collect(),
        };

        self.containers.lock().unwrap().insert(
            id.clone(),
            FakeContainer {
                container: ContainerRef {
                    id: id.clone(),
                    name: spec.name.clone(),
                    image: spec.image.clone(),
                },
                attrs,
            },
        );

        Ok(id)
    }

    async fn start(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn network_connect(&self, network: &str, id: &str) -> Result<()> {
        let mut containers = self.containers.lock().unwrap();
        if let Some(c) = containers.get_mut(id) {
            c.attrs.networks.push(network.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryProber for FakeRuntime {
    async fn remote_digest(&self, image: &str) -> Result<Digest> {
        self.remote_digests
            .lock()
            .unwrap()
            .get(image)
            .cloned()
            .ok_or_else(|| Error::Message(format!("no fake remote digest for `{image}`")))
    }
}
