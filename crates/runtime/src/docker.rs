//! The [`bollard`]-backed [`ContainerRuntime`] implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::image::CreateImageOptions;
use bollard::image::ListImagesOptions;
use bollard::models::ContainerCreateBody;
use bollard::models::EndpointSettings;
use bollard::models::HostConfig;
use bollard::models::NetworkingConfig;
use bollard::models::PortBinding as BollardPortBinding;
use bollard::models::RestartPolicy as BollardRestartPolicy;
use bollard::network::ConnectNetworkOptions;
use bollard::query_parameters::CreateContainerOptionsBuilder;
use bollard::query_parameters::InspectContainerOptionsBuilder;
use bollard::query_parameters::ListContainersOptionsBuilder;
use bollard::query_parameters::RemoveContainerOptionsBuilder;
use bollard::query_parameters::StartContainerOptionsBuilder;
use bollard::query_parameters::StopContainerOptionsBuilder;
use indexmap::IndexMap;
use tokio_stream::StreamExt as _;
use tracing::Level;
use tracing::debug;
use tracing::enabled;
use tracing::trace;
use tracing::warn;

use crate::ContainerRuntime;
use crate::Error;
use crate::Result;
use crate::digest::Digest;
use crate::digest::ImageRef;
use crate::types::ContainerAttrs;
use crate::types::ContainerRef;
use crate::types::ContainerSpec;
use crate::types::PortBindings;
use crate::types::RestartPolicy;

/// A container runtime client backed by a local Docker-compatible daemon.
#[derive(Clone, Debug)]
pub struct Docker(bollard::Docker);

impl Docker {
    /// Creates a new [`Docker`] with the specified [client](bollard::Docker).
    pub fn new(client: bollard::Docker) -> Self {
        Self(client)
    }

    /// Attempts to connect using the platform's default mechanism (a local
    /// socket on Unix, a named pipe on Windows).
    ///
    /// Returns [`Error::RuntimeUnavailable`] on failure; callers at process
    /// start should treat that as fatal.
    pub fn connect() -> Result<Self> {
        let client = bollard::Docker::connect_with_defaults()
            .map_err(|err| Error::RuntimeUnavailable(err.to_string()))?;
        Ok(Self::new(client))
    }

    /// Gets a reference to the inner [`bollard::Docker`].
    pub fn inner(&self) -> &bollard::Docker {
        &self.0
    }
}

#[async_trait]
impl ContainerRuntime for Docker {
    async fn list_running(&self) -> Result<Vec<ContainerRef>> {
        debug!("listing running containers");

        let options = ListContainersOptionsBuilder::new().all(false).build();
        let containers = self.0.list_containers(Some(options)).await?;

        debug!("found {} running containers", containers.len());

        let mut refs = Vec::with_capacity(containers.len());
        for summary in containers {
            let Some(id) = summary.id else {
                warn!("skipping container summary missing an id");
                continue;
            };
            let name = summary
                .names
                .and_then(|names| names.into_iter().next())
                .map(|name| name.trim_start_matches('/').to_string())
                .unwrap_or_else(|| id.clone());
            let Some(image) = summary.image else {
                warn!("skipping container `{name}`: missing image");
                continue;
            };

            if enabled!(Level::TRACE) {
                trace!("  container: {name} ({image})");
            }

            refs.push(ContainerRef { id, name, image });
        }

        Ok(refs)
    }

    async fn inspect(&self, id: &str) -> Result<ContainerAttrs> {
        debug!("inspecting container `{id}`");

        let options = InspectContainerOptionsBuilder::new().build();
        let inspect = self.0.inspect_container(id, Some(options)).await?;

        let name = inspect
            .name
            .map(|n| n.trim_start_matches('/').to_string())
            .ok_or_else(|| Error::MissingField(id.to_string(), "Name"))?;

        let config = inspect
            .config
            .ok_or_else(|| Error::MissingField(id.to_string(), "Config"))?;
        let host_config = inspect
            .host_config
            .unwrap_or_default();
        let networks = inspect
            .network_settings
            .and_then(|settings| settings.networks)
            .map(|networks| networks.into_keys().collect())
            .unwrap_or_default();

        let image = config
            .image
            .ok_or_else(|| Error::MissingField(id.to_string(), "Config.Image"))?;

        let port_bindings = host_config
            .port_bindings
            .unwrap_or_default()
            .into_iter()
            .map(|(port, bindings)| {
                let bindings = bindings
                    .unwrap_or_default()
                    .into_iter()
                    .map(|b| crate::types::PortBinding {
                        host_ip: b.host_ip,
                        host_port: b.host_port,
                    })
                    .collect();
                (port, bindings)
            })
            .collect::<IndexMap<_, _>>();

        let restart_policy = host_config
            .restart_policy
            .map(|policy| RestartPolicy {
                name: policy
                    .name
                    .map(|n| format!("{n:?}").to_lowercase().replace('_', "-")),
                maximum_retry_count: policy.maximum_retry_count,
            })
            .unwrap_or_default();

        Ok(ContainerAttrs {
            image,
            name,
            cmd: config.cmd,
            env: config.env.unwrap_or_default(),
            binds: host_config.binds.unwrap_or_default(),
            port_bindings,
            restart_policy,
            networks,
        })
    }

    async fn local_repo_digests(&self, image: &str) -> Result<Vec<Digest>> {
        let parsed = ImageRef::parse(image);

        let mut filters = HashMap::new();
        filters.insert("reference".to_string(), vec![image.to_string()]);

        let images = self
            .0
            .list_images(Some(ListImagesOptions {
                filters,
                ..Default::default()
            }))
            .await?;

        let digests = images
            .into_iter()
            .flat_map(|summary| summary.repo_digests)
            .map(|d| Digest::new(&parsed.repository, &d))
            .collect();

        Ok(digests)
    }

    async fn pull(&self, image: &str) -> Result<()> {
        let parsed = ImageRef::parse(image);
        debug!("pulling image `{image}`");

        let mut stream = self.0.create_image(
            Some(CreateImageOptions {
                from_image: parsed.repository.as_str(),
                tag: parsed.tag_or_latest(),
                ..Default::default()
            }),
            None,
            None,
        );

        while let Some(update) = stream.next().await {
            let update = update?;
            if enabled!(Level::TRACE) {
                trace!("pull update for `{image}`: {update:?}");
            }
        }

        Ok(())
    }

    async fn stop(&self, id: &str, grace_period: Duration) -> Result<()> {
        debug!("stopping container `{id}`");
        let options = StopContainerOptionsBuilder::new()
            .t(grace_period.as_secs() as i32)
            .build();
        self.0.stop_container(id, Some(options)).await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        debug!("removing container `{id}`");
        let options = RemoveContainerOptionsBuilder::new().build();
        self.0.remove_container(id, Some(options)).await?;
        Ok(())
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<String> {
        debug!("creating container `{}` from `{}`", spec.name, spec.image);

        let options = CreateContainerOptionsBuilder::new()
            .name(&spec.name)
            .build();

        let host_config = HostConfig {
            binds: Some(spec.binds.clone()),
            port_bindings: Some(to_bollard_port_bindings(&spec.port_bindings)),
            restart_policy: Some(BollardRestartPolicy {
                name: spec.restart_policy.name.as_deref().map(parse_restart_name),
                maximum_retry_count: spec.restart_policy.maximum_retry_count,
            }),
            ..Default::default()
        };

        let networking_config = spec.primary_network.as_ref().map(|network| {
            let mut endpoints_config = HashMap::new();
            endpoints_config.insert(network.clone(), EndpointSettings::default());
            NetworkingConfig { endpoints_config }
        });

        let body = ContainerCreateBody {
            image: Some(spec.image.clone()),
            cmd: spec.cmd.clone(),
            env: Some(spec.env.clone()),
            host_config: Some(host_config),
            networking_config,
            ..Default::default()
        };

        let response = self.0.create_container(Some(options), body).await?;
        Ok(response.id)
    }

    async fn start(&self, id: &str) -> Result<()> {
        debug!("starting container `{id}`");
        let options = StartContainerOptionsBuilder::new().build();
        self.0.start_container(id, Some(options)).await?;
        Ok(())
    }

    async fn network_connect(&self, network: &str, id: &str) -> Result<()> {
        debug!("connecting container `{id}` to network `{network}`");
        self.0
            .connect_network(
                network,
                ConnectNetworkOptions {
                    container: id.to_string(),
                    endpoint_config: EndpointSettings::default(),
                },
            )
            .await?;
        Ok(())
    }
}

/// Converts our [`PortBindings`] back into bollard's representation.
fn to_bollard_port_bindings(
    bindings: &PortBindings,
) -> HashMap<String, Option<Vec<BollardPortBinding>>> {
    bindings
        .iter()
        .map(|(port, entries)| {
            let entries = entries
                .iter()
                .map(|b| BollardPortBinding {
                    host_ip: b.host_ip.clone(),
                    host_port: b.host_port.clone(),
                })
                .collect();
            (port.clone(), Some(entries))
        })
        .collect()
}

/// Parses a restart policy name string back into bollard's enum via its
/// `Debug`-driven `FromStr`-like round trip is unavailable in this bollard
/// version, so policies are passed through as the raw captured name.
fn parse_restart_name(name: &str) -> bollard::models::HostConfigRestartPolicyNameEnum {
    use bollard::models::HostConfigRestartPolicyNameEnum as Name;
    match name {
        "always" => Name::ALWAYS,
        "unless-stopped" => Name::UNLESS_STOPPED,
        "on-failure" => Name::ON_FAILURE,
        "no" => Name::NO,
        _ => Name::EMPTY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_name_round_trips_known_values() {
        assert!(matches!(
            parse_restart_name("always"),
            bollard::models::HostConfigRestartPolicyNameEnum::ALWAYS
        ));
        assert!(matches!(
            parse_restart_name("bogus"),
            bollard::models::HostConfigRestartPolicyNameEnum::EMPTY
        ));
    }
}
