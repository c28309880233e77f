//! Data types shared by the runtime adapter.

use indexmap::IndexMap;

/// A reference to a running container as returned by [`super::ContainerRuntime::list_running`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerRef {
    /// The runtime-assigned container id.
    pub id: String,

    /// The container's name.
    pub name: String,

    /// The image reference the container was created from (`Config.Image`).
    pub image: String,
}

/// A bind mount as reported by `HostConfig.Binds`.
pub type Bind = String;

/// A port binding entry, keyed by `"<port>/<proto>"`.
pub type PortBindings = IndexMap<String, Vec<PortBinding>>;

/// A single host binding for a container port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortBinding {
    /// The host IP to bind to, if any.
    pub host_ip: Option<String>,

    /// The host port to bind to, if any.
    pub host_port: Option<String>,
}

/// A restart policy as reported by `HostConfig.RestartPolicy`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RestartPolicy {
    /// The restart policy name (e.g. `"always"`, `"unless-stopped"`, `"no"`).
    pub name: Option<String>,

    /// The maximum retry count, for `"on-failure"` policies.
    pub maximum_retry_count: Option<i64>,
}

/// The full set of runtime configuration captured from an existing container,
/// sufficient to recreate it with the same observable behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerAttrs {
    /// The image reference (`Config.Image`).
    pub image: String,

    /// The container's name.
    pub name: String,

    /// The command to run (`Config.Cmd`), if overridden.
    pub cmd: Option<Vec<String>>,

    /// Environment variables (`Config.Env`), each of the form `KEY=VALUE`.
    pub env: Vec<String>,

    /// Bind mounts (`HostConfig.Binds`).
    pub binds: Vec<Bind>,

    /// Port bindings (`HostConfig.PortBindings`).
    pub port_bindings: PortBindings,

    /// The restart policy.
    pub restart_policy: RestartPolicy,

    /// The ordered names of networks this container is attached to.
    pub networks: Vec<String>,
}

/// A specification for creating a replacement container from a captured
/// [`ContainerAttrs`] and a new image reference.
#[derive(Clone, Debug)]
pub struct ContainerSpec {
    /// The name to give the new container.
    pub name: String,

    /// The new image reference to create the container from.
    pub image: String,

    /// The command to run, if overridden.
    pub cmd: Option<Vec<String>>,

    /// Environment variables, each of the form `KEY=VALUE`.
    pub env: Vec<String>,

    /// Bind mounts.
    pub binds: Vec<Bind>,

    /// Port bindings.
    pub port_bindings: PortBindings,

    /// The restart policy.
    pub restart_policy: RestartPolicy,

    /// The network to attach at creation time, if any.
    ///
    /// Any remaining networks from the snapshot are connected separately via
    /// [`super::ContainerRuntime::network_connect`] after the container starts.
    pub primary_network: Option<String>,
}

impl ContainerSpec {
    /// Builds a [`ContainerSpec`] for replacing a container described by
    /// `attrs` with a newer `image`.
    ///
    /// Implements the network-selection rule: when the snapshot recorded more
    /// than one network, the implicit `bridge` network (present only when a
    /// container has no other networks) is suppressed, and the first
    /// remaining network is attached at creation time. Any further networks
    /// are left for the caller to connect after start.
    pub fn from_attrs(attrs: &ContainerAttrs, image: impl Into<String>) -> (Self, Vec<String>) {
        let mut networks = attrs.networks.clone();
        if networks.len() > 1 {
            networks.retain(|n| n != "bridge");
        }

        let primary_network = if networks.is_empty() {
            None
        } else {
            Some(networks.remove(0))
        };

        let spec = Self {
            name: attrs.name.clone(),
            image: image.into(),
            cmd: attrs.cmd.clone(),
            env: attrs.env.clone(),
            binds: attrs.binds.clone(),
            port_bindings: attrs.port_bindings.clone(),
            restart_policy: attrs.restart_policy.clone(),
            primary_network,
        };

        (spec, networks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs_with_networks(networks: Vec<&str>) -> ContainerAttrs {
        ContainerAttrs {
            image: "nginx:1.25".into(),
            name: "web".into(),
            cmd: None,
            env: vec![],
            binds: vec![],
            port_bindings: PortBindings::default(),
            restart_policy: RestartPolicy::default(),
            networks: networks.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn single_bridge_network_is_kept() {
        let attrs = attrs_with_networks(vec!["bridge"]);
        let (spec, rest) = ContainerSpec::from_attrs(&attrs, "nginx:1.26");
        assert_eq!(spec.primary_network.as_deref(), Some("bridge"));
        assert!(rest.is_empty());
    }

    #[test]
    fn bridge_is_suppressed_when_other_networks_exist() {
        let attrs = attrs_with_networks(vec!["bridge", "app-net"]);
        let (spec, rest) = ContainerSpec::from_attrs(&attrs, "nginx:1.26");
        assert_eq!(spec.primary_network.as_deref(), Some("app-net"));
        assert!(rest.is_empty());
    }

    #[test]
    fn extra_networks_beyond_the_first_are_returned() {
        let attrs = attrs_with_networks(vec!["app-net", "observability"]);
        let (spec, rest) = ContainerSpec::from_attrs(&attrs, "nginx:1.26");
        assert_eq!(spec.primary_network.as_deref(), Some("app-net"));
        assert_eq!(rest, vec!["observability".to_string()]);
    }
}
