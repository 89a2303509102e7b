//! Commit analysis, version calculation, and changelog generation.
//!
//! Parses conventional commits, determines the next semantic version from
//! the changesets since the last tag, and renders the changelog entry for
//! that version using Tera templates.
use log::*;

use crate::{
    analyzer::{
        changelog::EntryRequest,
        release::{Changeset, Tag},
        version::NextVersion,
    },
    overrides::ReleaseOverrides,
    result::Result,
    templates::Templates,
};

pub mod changelog;
pub mod commit;
pub mod release;
pub mod version;

/// A proposed release: the computed version and its rendered changelog
/// entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: NextVersion,
    /// Forge release URL for `version`.
    pub link: String,
    /// Rendered changelog entry, ready for insertion into `CHANGELOG.md`.
    pub notes: String,
}

/// Turns changesets and user overrides into a [`Release`].
pub struct Analyzer<'a> {
    templates: &'a Templates,
    tag_prefix: String,
}

impl<'a> Analyzer<'a> {
    pub fn new(templates: &'a Templates, tag_prefix: impl Into<String>) -> Self {
        Self {
            templates,
            tag_prefix: tag_prefix.into(),
        }
    }

    /// Compute the next version and render its changelog entry. Returns
    /// `Ok(None)` when there is nothing to release. `release_link` maps a
    /// tag name to the forge's release URL for it.
    pub fn analyze<F>(
        &self,
        tag: Option<&Tag>,
        changesets: &[Changeset],
        overrides: &ReleaseOverrides,
        release_link: F,
    ) -> Result<Option<Release>>
    where
        F: Fn(&str) -> String,
    {
        let Some(version) = version::next_version(
            tag,
            changesets,
            overrides.next_version_type,
            &self.tag_prefix,
        )?
        else {
            return Ok(None);
        };

        let link = release_link(&version.tag_name);

        let notes = changelog::render_entry(
            self.templates,
            EntryRequest {
                changesets,
                version: &version.tag_name,
                link: &link,
                prefix: overrides.prefix.as_deref(),
                suffix: overrides.suffix.as_deref(),
            },
        )?;

        info!("next release: {version}");

        Ok(Some(Release {
            version,
            link,
            notes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{
        commit::{AnalyzedCommit, Commit},
        version::NextVersionType,
    };

    fn changesets() -> Vec<Changeset> {
        [
            (1, "fix: correct null check"),
            (2, "feat: add retry option"),
        ]
        .into_iter()
        .map(|(n, msg)| Changeset {
            url: format!("https://github.com/owner/repo/pull/{n}"),
            identifier: format!("#{n}"),
            changelog_entries: AnalyzedCommit::parse(&Commit::new(
                format!("sha{n}"),
                msg,
            ))
            .into_iter()
            .collect(),
        })
        .collect()
    }

    fn link(tag: &str) -> String {
        format!("https://github.com/owner/repo/releases/tag/{tag}")
    }

    #[test]
    fn test_analyze_feature_and_fix_since_tag() {
        let templates = Templates::load().unwrap();
        let analyzer = Analyzer::new(&templates, "v");
        let tag = Tag::new("base", "v1.2.0");

        let release = analyzer
            .analyze(
                Some(&tag),
                &changesets(),
                &ReleaseOverrides::default(),
                link,
            )
            .unwrap()
            .unwrap();

        assert_eq!(release.version.semver, semver::Version::new(1, 3, 0));
        assert_eq!(release.link, link("v1.3.0"));
        assert!(release.notes.starts_with(
            "## [v1.3.0](https://github.com/owner/repo/releases/tag/v1.3.0)"
        ));
        assert_eq!(release.notes.matches("- add retry option").count(), 1);
        assert_eq!(release.notes.matches("- correct null check").count(), 1);
    }

    #[test]
    fn test_analyze_applies_overrides() {
        let templates = Templates::load().unwrap();
        let analyzer = Analyzer::new(&templates, "v");
        let tag = Tag::new("base", "v1.2.0");
        let overrides = ReleaseOverrides {
            next_version_type: Some(NextVersionType::Major),
            prefix: Some("Big one.".into()),
            suffix: None,
        };

        let release = analyzer
            .analyze(Some(&tag), &changesets(), &overrides, link)
            .unwrap()
            .unwrap();

        assert_eq!(release.version.tag_name, "v2.0.0");
        assert!(release.notes.contains("Big one."));
    }

    #[test]
    fn test_analyze_nothing_to_release() {
        let templates = Templates::load().unwrap();
        let analyzer = Analyzer::new(&templates, "v");

        let chores = vec![Changeset {
            url: "u".into(),
            identifier: "#9".into(),
            changelog_entries: AnalyzedCommit::parse(&Commit::new(
                "sha", "chore: tidy",
            ))
            .into_iter()
            .collect(),
        }];

        let release = analyzer
            .analyze(None, &chores, &ReleaseOverrides::default(), link)
            .unwrap();

        assert!(release.is_none());
    }
}
