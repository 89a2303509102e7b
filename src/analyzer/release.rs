//! Data types for tags and changesets.
use serde::Serialize;
use std::fmt::Display;

use crate::{
    analyzer::commit::AnalyzedCommit, error::ReleaserError, result::Result,
};

/// The most recent release marker on the base branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Commit SHA the tag points at.
    pub hash: String,
    /// Tag name, including any prefix (e.g. `v1.2.0`).
    pub name: String,
}

impl Tag {
    pub fn new(hash: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
        }
    }

    /// Parse the semantic version out of the tag name after stripping
    /// `prefix` from the front.
    pub fn semver(&self, prefix: &str) -> Result<semver::Version> {
        let stripped = strip_tag_prefix(&self.name, prefix);
        semver::Version::parse(stripped).map_err(|_| {
            ReleaserError::InvalidTag {
                name: self.name.clone(),
            }
            .into()
        })
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Strip a literal prefix from a tag name.
pub fn strip_tag_prefix<'a>(name: &'a str, prefix: &str) -> &'a str {
    name.strip_prefix(prefix).unwrap_or(name)
}

/// Release-relevant content contributed by one merged pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Changeset {
    /// Web URL of the pull request.
    pub url: String,
    /// Short human identifier, e.g. `#42`.
    pub identifier: String,
    #[serde(skip)]
    pub changelog_entries: Vec<AnalyzedCommit>,
}

impl Changeset {
    pub fn entries(&self) -> impl Iterator<Item = &AnalyzedCommit> {
        self.changelog_entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_semver_with_prefix() {
        let tag = Tag::new("abc", "v1.2.0");
        assert_eq!(tag.semver("v").unwrap(), semver::Version::new(1, 2, 0));
    }

    #[test]
    fn test_tag_semver_without_prefix() {
        let tag = Tag::new("abc", "2.0.1");
        assert_eq!(tag.semver("").unwrap(), semver::Version::new(2, 0, 1));
        // prefix missing on the tag itself is tolerated
        assert_eq!(tag.semver("v").unwrap(), semver::Version::new(2, 0, 1));
    }

    #[test]
    fn test_tag_prefix_is_literal() {
        let tag = Tag::new("abc", "api.v1.0.0");
        assert_eq!(tag.semver("api.v").unwrap(), semver::Version::new(1, 0, 0));
        assert!(Tag::new("abc", "apixv1.0.0").semver("api.v").is_err());
    }

    #[test]
    fn test_strip_tag_prefix() {
        assert_eq!(strip_tag_prefix("v1.2.0", "v"), "1.2.0");
        assert_eq!(strip_tag_prefix("1.2.0", "v"), "1.2.0");
        assert_eq!(strip_tag_prefix("v1.2.0", ""), "v1.2.0");
        // only a leading prefix is removed
        assert_eq!(strip_tag_prefix("1.2.0-v", "v"), "1.2.0-v");
        assert_eq!(strip_tag_prefix("a+b1.0.0", "a+b"), "1.0.0");
    }

    #[test]
    fn test_invalid_tag_name() {
        let err = Tag::new("abc", "nightly").semver("v").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReleaserError>(),
            Some(ReleaserError::InvalidTag { .. })
        ));
    }
}
