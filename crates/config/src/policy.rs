//! The exclusion policy governing which containers are checked.

use std::collections::HashSet;

use bon::Builder;

/// Decides which containers are eligible for update checking.
///
/// A container is excluded if its name is an exact match in
/// [`excluded_names`](Self::excluded_names), or if any pattern in
/// [`excluded_image_patterns`](Self::excluded_image_patterns) is a substring
/// of its image reference. Pattern matching is deliberately plain substring
/// matching; glob or regex support is out of scope.
#[derive(Builder, Clone, Debug, Default, PartialEq, Eq)]
#[builder(builder_type = Builder)]
pub struct ExclusionPolicy {
    /// Container names excluded by exact match.
    #[builder(into, default)]
    excluded_names: HashSet<String>,

    /// Substrings that, if present in an image reference, exclude the
    /// container.
    #[builder(into, default)]
    excluded_image_patterns: HashSet<String>,
}

impl ExclusionPolicy {
    /// Returns the excluded container names.
    pub fn excluded_names(&self) -> &HashSet<String> {
        &self.excluded_names
    }

    /// Returns the excluded image substring patterns.
    pub fn excluded_image_patterns(&self) -> &HashSet<String> {
        &self.excluded_image_patterns
    }

    /// Returns `true` if a container with `name` and `image` should be
    /// checked for updates.
    pub fn should_check(&self, name: &str, image: &str) -> bool {
        if self.excluded_names.contains(name) {
            return false;
        }

        if self
            .excluded_image_patterns
            .iter()
            .any(|pattern| image.contains(pattern.as_str()))
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_by_exact_name() {
        let policy = ExclusionPolicy::builder()
            .excluded_names(["db".to_string()])
            .build();
        assert!(!policy.should_check("db", "postgres:15"));
        assert!(policy.should_check("web", "postgres:15"));
    }

    #[test]
    fn excludes_by_image_substring() {
        let policy = ExclusionPolicy::builder()
            .excluded_image_patterns(["nginx".to_string()])
            .build();
        assert!(!policy.should_check("web", "library/nginx:1.25"));
        assert!(policy.should_check("api", "myapp/api:1.0"));
    }

    #[test]
    fn empty_policy_checks_everything() {
        let policy = ExclusionPolicy::default();
        assert!(policy.should_check("anything", "anything:latest"));
    }
}
