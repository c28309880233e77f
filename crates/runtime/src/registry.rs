//! Remote registry digest probing over the OCI Distribution API.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::WWW_AUTHENTICATE;
use tracing::debug;
use tracing::trace;

use crate::Error;
use crate::Result;
use crate::digest::Digest;
use crate::digest::ImageRef;

/// Something capable of determining the current remote registry digest for
/// an image reference.
///
/// Abstracted behind a trait so the Digest Comparator can be exercised in
/// tests without performing real HTTP requests.
#[async_trait]
pub trait RegistryProber: Send + Sync {
    /// Returns the current remote digest for `image`.
    async fn remote_digest(&self, image: &str) -> Result<Digest>;
}

/// The default [`RegistryProber`], backed by a real [`reqwest::Client`].
#[derive(Clone, Debug, Default)]
pub struct HttpRegistryProber {
    client: Client,
}

impl HttpRegistryProber {
    /// Creates a new prober with a fresh HTTP client.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistryProber for HttpRegistryProber {
    async fn remote_digest(&self, image: &str) -> Result<Digest> {
        remote_digest(&self.client, image).await
    }
}

#[async_trait]
impl<T: RegistryProber + ?Sized> RegistryProber for std::sync::Arc<T> {
    async fn remote_digest(&self, image: &str) -> Result<Digest> {
        (**self).remote_digest(image).await
    }
}

/// The manifest media types accepted, covering Docker v2 and OCI images and
/// manifest lists.
const ACCEPT_MANIFESTS: &str = concat!(
    "application/vnd.docker.distribution.manifest.v2+json, ",
    "application/vnd.docker.distribution.manifest.list.v2+json, ",
    "application/vnd.oci.image.manifest.v1+json, ",
    "application/vnd.oci.image.index.v1+json"
);

/// Probes a public (or anonymously-readable) registry for the current
/// manifest digest of `image`, returning a repo digest comparable with the
/// local runtime's `RepoDigests`.
///
/// Implements the HEAD + bearer-challenge flow: an unauthenticated `HEAD` is
/// attempted first; on `401` the `WWW-Authenticate` header is parsed for the
/// realm/service/scope, a bearer token is fetched, and the request is
/// retried with the resulting `Authorization` header.
pub async fn remote_digest(client: &Client, reference: &str) -> Result<Digest> {
    let image = ImageRef::parse(reference);
    let (registry, repository) = split_registry(&image.repository);
    let url = format!(
        "https://{registry}/v2/{repository}/manifests/{}",
        image.tag_or_latest()
    );

    debug!("probing registry manifest: {url}");

    let response = client
        .head(&url)
        .header(ACCEPT, ACCEPT_MANIFESTS)
        .send()
        .await
        .map_err(Error::Registry)?;

    let response = if response.status() == StatusCode::UNAUTHORIZED {
        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Message(format!("registry at {registry} requires auth but sent no challenge")))?
            .to_string();

        let token = fetch_bearer_token(client, &challenge).await?;

        client
            .head(&url)
            .header(ACCEPT, ACCEPT_MANIFESTS)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(Error::Registry)?
    } else {
        response
    };

    if !response.status().is_success() {
        return Err(Error::Message(format!(
            "registry probe for `{reference}` failed with status {}",
            response.status()
        )));
    }

    let digest_header = response
        .headers()
        .get("docker-content-digest")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Message(format!("registry response for `{reference}` had no digest header")))?;

    trace!("remote digest for `{reference}`: {digest_header}");

    Ok(Digest::new(&image.repository, digest_header))
}

/// Splits an image repository into `(registry, repository)`, defaulting to
/// Docker Hub and the `library/` namespace for unqualified references.
fn split_registry(repository: &str) -> (String, String) {
    match repository.split_once('/') {
        Some((first, rest)) if first.contains('.') || first.contains(':') || first == "localhost" => {
            (first.to_string(), rest.to_string())
        }
        Some(_) => ("registry-1.docker.io".to_string(), repository.to_string()),
        None => (
            "registry-1.docker.io".to_string(),
            format!("library/{repository}"),
        ),
    }
}

/// Fetches a bearer token from the realm named in a `WWW-Authenticate`
/// challenge header, per the Docker Registry token authentication spec.
async fn fetch_bearer_token(client: &Client, challenge: &str) -> Result<String> {
    let realm = extract_field(challenge, "realm")
        .ok_or_else(|| Error::Message("auth challenge missing realm".into()))?;
    let service = extract_field(challenge, "service");
    let scope = extract_field(challenge, "scope");

    let mut request = client.get(&realm);
    if let Some(service) = &service {
        request = request.query(&[("service", service)]);
    }
    if let Some(scope) = &scope {
        request = request.query(&[("scope", scope)]);
    }

    let body: serde_json::Value = request
        .send()
        .await
        .map_err(Error::Registry)?
        .json()
        .await
        .map_err(Error::Registry)?;

    body.get("token")
        .or_else(|| body.get("access_token"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Message("token response had no token field".into()))
}

/// Extracts a quoted `key="value"` field from a `WWW-Authenticate` header.
fn extract_field(challenge: &str, key: &str) -> Option<String> {
    let pattern = format!(r#"{key}="([^"]*)""#);
    Regex::new(&pattern)
        .ok()?
        .captures(challenge)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
