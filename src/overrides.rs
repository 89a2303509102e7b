//! User overrides embedded in the release pull request description, and
//! rendering of that description.
use log::*;
use serde::Serialize;

use crate::{
    analyzer::version::NextVersionType,
    markdown::{self, BlockParser},
    result::Result,
    templates::{PULL_REQUEST_TEMPLATE_NAME, Templates},
};

/// Engine-owned section holding the rendered changelog entry.
pub const CHANGELOG_SECTION: &str = "changelog";
/// Forces the next version bump: `major`, `minor` or `patch`.
pub const NEXT_VERSION_TYPE_SECTION: &str = "next-version-type";
/// Text rendered above the grouped changelog entries.
pub const PREFIX_SECTION: &str = "changelog-prefix";
/// Text rendered below the grouped changelog entries.
pub const SUFFIX_SECTION: &str = "changelog-suffix";

/// Directives a user left in the release pull request description. Every
/// field defaults to "no override".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOverrides {
    pub next_version_type: Option<NextVersionType>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl ReleaseOverrides {
    /// Extract overrides from a pull request description. Malformed values
    /// are logged and ignored without affecting other sections.
    pub fn from_description(description: &str) -> Self {
        let blocks = BlockParser::default().parse(description);

        let section = |name: &str| {
            markdown::find_section(&blocks, name)
                .map(|b| b.content(description).trim())
                .filter(|content| !content.is_empty())
        };

        let next_version_type =
            section(NEXT_VERSION_TYPE_SECTION).and_then(|value| {
                match value.parse::<NextVersionType>() {
                    Ok(parsed) => Some(parsed),
                    Err(err) => {
                        warn!("ignoring {NEXT_VERSION_TYPE_SECTION} override: {err}");
                        None
                    }
                }
            });

        let overrides = Self {
            next_version_type,
            prefix: section(PREFIX_SECTION).map(String::from),
            suffix: section(SUFFIX_SECTION).map(String::from),
        };

        debug!("parsed release overrides: {overrides:?}");

        overrides
    }
}

#[derive(Debug, Serialize)]
struct DescriptionView<'a> {
    changelog: &'a str,
    prefix: &'a str,
    suffix: &'a str,
    next_version_type: String,
}

/// Produce the release pull request description.
///
/// With an existing description only the body of the `changelog` section
/// is replaced so user edits elsewhere survive. Otherwise a fresh
/// description is rendered, carrying `overrides` into their sections.
pub fn render_description(
    templates: &Templates,
    existing: Option<&str>,
    changelog: &str,
    overrides: &ReleaseOverrides,
) -> Result<String> {
    if let Some(existing) = existing {
        if let Some(updated) =
            markdown::replace_section(existing, CHANGELOG_SECTION, changelog)
        {
            return Ok(updated);
        }

        warn!(
            "existing pull request description has no {CHANGELOG_SECTION} section: rendering a new one"
        );
    }

    let view = DescriptionView {
        changelog: changelog.trim(),
        prefix: overrides.prefix.as_deref().unwrap_or_default(),
        suffix: overrides.suffix.as_deref().unwrap_or_default(),
        next_version_type: overrides
            .next_version_type
            .map(|t| t.to_string())
            .unwrap_or_default(),
    };

    let context = tera::Context::from_serialize(&view)?;
    templates.render(PULL_REQUEST_TEMPLATE_NAME, &context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_version_override() {
        let description = "Release notes\n\n<!-- section-start next-version-type --> minor <!-- section-end next-version-type -->\n";
        let overrides = ReleaseOverrides::from_description(description);

        assert_eq!(overrides.next_version_type, Some(NextVersionType::Minor));
        assert_eq!(overrides.prefix, None);
        assert_eq!(overrides.suffix, None);
    }

    #[test]
    fn test_empty_description_has_no_overrides() {
        assert_eq!(
            ReleaseOverrides::from_description(""),
            ReleaseOverrides::default()
        );
    }

    #[test]
    fn test_malformed_version_type_keeps_other_sections() {
        let description = "<!-- section-start next-version-type -->\nhuge\n<!-- section-end next-version-type -->\n<!-- section-start changelog-prefix -->\nHello\n<!-- section-end changelog-prefix -->\n";
        let overrides = ReleaseOverrides::from_description(description);

        assert_eq!(overrides.next_version_type, None);
        assert_eq!(overrides.prefix.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_empty_sections_are_no_override() {
        let templates = Templates::load().unwrap();
        let rendered = render_description(
            &templates,
            None,
            "## [v1.0.0](l)",
            &ReleaseOverrides::default(),
        )
        .unwrap();

        assert_eq!(
            ReleaseOverrides::from_description(&rendered),
            ReleaseOverrides::default()
        );
    }

    #[test]
    fn test_rendered_description_round_trips_overrides() {
        let templates = Templates::load().unwrap();
        let overrides = ReleaseOverrides {
            next_version_type: Some(NextVersionType::Patch),
            prefix: Some("Start here.".into()),
            suffix: Some("The end.".into()),
        };

        let rendered =
            render_description(&templates, None, "## [v1.0.1](l)", &overrides)
                .unwrap();

        assert_eq!(ReleaseOverrides::from_description(&rendered), overrides);
        assert_eq!(
            markdown::section_content(&rendered, CHANGELOG_SECTION),
            Some("## [v1.0.1](l)")
        );
    }

    #[test]
    fn test_existing_description_keeps_user_edits() {
        let templates = Templates::load().unwrap();
        let existing = "<!-- section-start changelog -->\n## [v1.0.0](l)\n<!-- section-end changelog -->\n\nPlease double check the migration notes.\n\n<!-- section-start next-version-type -->\nmajor\n<!-- section-end next-version-type -->\n";

        let updated = render_description(
            &templates,
            Some(existing),
            "## [v2.0.0](l)\n\n- new stuff\n",
            &ReleaseOverrides::default(),
        )
        .unwrap();

        assert!(updated.starts_with(
            "<!-- section-start changelog -->\n## [v2.0.0](l)\n\n- new stuff\n<!-- section-end changelog -->\n"
        ));
        assert!(updated.ends_with(&existing[existing.find("\n\nPlease").unwrap()..]));
        assert_eq!(
            ReleaseOverrides::from_description(&updated).next_version_type,
            Some(NextVersionType::Major)
        );
    }

    #[test]
    fn test_existing_description_without_changelog_is_rerendered() {
        let templates = Templates::load().unwrap();
        let overrides = ReleaseOverrides {
            next_version_type: Some(NextVersionType::Minor),
            ..Default::default()
        };

        let updated = render_description(
            &templates,
            Some("someone wiped the description"),
            "## [v1.1.0](l)",
            &overrides,
        )
        .unwrap();

        assert!(!updated.contains("someone wiped"));
        assert_eq!(ReleaseOverrides::from_description(&updated), overrides);
    }
}
