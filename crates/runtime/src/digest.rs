//! Image reference parsing and repo-digest comparison.

/// A parsed image reference of the form `repository[:tag][@digest]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    /// The repository portion (everything before the first `:`).
    ///
    /// NOTE: this is a naive split on the first `:`, preserved as-is from the
    /// source tool this crate's behavior was distilled from. It mishandles
    /// registry references that embed a port, e.g. `host:5000/repo:tag`,
    /// where `host` would be taken as the repository. See `DESIGN.md` for the
    /// decision to keep this behavior rather than silently changing it.
    pub repository: String,

    /// The tag portion, if present and the reference was not pinned by
    /// digest.
    pub tag: Option<String>,
}

impl ImageRef {
    /// Parses an image reference string.
    pub fn parse(reference: &str) -> Self {
        let without_digest = reference.split('@').next().unwrap_or(reference);

        match without_digest.split_once(':') {
            Some((repository, tag)) => Self {
                repository: repository.to_string(),
                tag: Some(tag.to_string()),
            },
            None => Self {
                repository: without_digest.to_string(),
                tag: None,
            },
        }
    }

    /// Returns the tag, defaulting to `latest` when unspecified.
    pub fn tag_or_latest(&self) -> &str {
        self.tag.as_deref().unwrap_or("latest")
    }
}

/// A fully-qualified repo digest, `<repository>@sha256:<hex>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Digest(String);

impl Digest {
    /// Builds a [`Digest`] from a repository and a bare `sha256:<hex>` value.
    ///
    /// If `sha256` already contains a `@`, it is assumed to be a full repo
    /// digest and is used as-is (this mirrors how local image records
    /// already store `RepoDigests` in the `repo@sha256:...` form).
    pub fn new(repository: &str, sha256: &str) -> Self {
        if sha256.contains('@') {
            Self(sha256.to_string())
        } else {
            Self(format!("{repository}@{sha256}"))
        }
    }

    /// Returns the underlying string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repository_and_tag() {
        let image = ImageRef::parse("nginx:1.25");
        assert_eq!(image.repository, "nginx");
        assert_eq!(image.tag.as_deref(), Some("1.25"));
    }

    #[test]
    fn defaults_missing_tag_to_latest() {
        let image = ImageRef::parse("nginx");
        assert_eq!(image.repository, "nginx");
        assert_eq!(image.tag_or_latest(), "latest");
    }

    #[test]
    fn strips_a_pinned_digest_suffix() {
        let image = ImageRef::parse("nginx:1.25@sha256:abcd");
        assert_eq!(image.repository, "nginx");
        assert_eq!(image.tag.as_deref(), Some("1.25"));
    }

    #[test]
    fn registry_port_is_mishandled_by_design() {
        // Preserves the source behavior's naive first-`:`-split; see DESIGN.md.
        let image = ImageRef::parse("host:5000/repo:tag");
        assert_eq!(image.repository, "host");
    }

    #[test]
    fn digest_equality_is_exact_string_match() {
        let a = Digest::new("nginx", "sha256:aaaa");
        let b = Digest::new("nginx", "sha256:aaaa");
        let c = Digest::new("nginx", "sha256:bbbb");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
