//! Changelog entry rendering and insertion into `CHANGELOG.md`.
use log::*;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::{
    analyzer::{commit::CommitType, release::Changeset},
    result::Result,
    templates::{CHANGELOG_TEMPLATE_NAME, Templates},
};

/// Name of the cumulative changelog document.
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";
/// Top-level heading new entries are inserted below.
pub const CHANGELOG_HEADER: &str = "# Changelog";

/// Matches 3 or more consecutive new lines
static EXTRA_NEW_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

#[derive(Debug, Serialize)]
struct EntryView<'a> {
    scope: Option<&'a str>,
    description: &'a str,
    breaking: bool,
    identifier: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct ChangelogView<'a> {
    version: &'a str,
    version_link: &'a str,
    prefix: &'a str,
    suffix: &'a str,
    features: Vec<EntryView<'a>>,
    fixes: Vec<EntryView<'a>>,
}

/// Inputs for a single changelog entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryRequest<'a> {
    pub changesets: &'a [Changeset],
    /// Version heading, usually the tag name.
    pub version: &'a str,
    /// Forge release URL for `version`.
    pub link: &'a str,
    pub prefix: Option<&'a str>,
    pub suffix: Option<&'a str>,
}

/// Render the changelog section for one version. Only `feat` and `fix`
/// entries are listed, in changeset order.
pub fn render_entry(
    templates: &Templates,
    req: EntryRequest<'_>,
) -> Result<String> {
    let mut features = vec![];
    let mut fixes = vec![];

    for changeset in req.changesets {
        for entry in changeset.entries() {
            let view = EntryView {
                scope: entry.scope.as_deref(),
                description: &entry.description,
                breaking: entry.breaking,
                identifier: &changeset.identifier,
                url: &changeset.url,
            };

            match entry.commit_type {
                CommitType::Feat => features.push(view),
                CommitType::Fix => fixes.push(view),
                CommitType::Other(_) => {}
            }
        }
    }

    debug!(
        "rendering changelog for {}: {} features, {} fixes",
        req.version,
        features.len(),
        fixes.len()
    );

    let view = ChangelogView {
        version: req.version,
        version_link: req.link,
        prefix: req.prefix.map(str::trim).unwrap_or_default(),
        suffix: req.suffix.map(str::trim).unwrap_or_default(),
        features,
        fixes,
    };

    let context = tera::Context::from_serialize(&view)?;
    let rendered = templates.render(CHANGELOG_TEMPLATE_NAME, &context)?;

    Ok(format!("{}\n", strip_extra_lines(&rendered)))
}

/// Normalize formatting by collapsing 3+ consecutive new lines into a single
/// blank line and trimming surrounding whitespace.
pub fn strip_extra_lines(content: &str) -> String {
    EXTRA_NEW_LINES_REGEX
        .replace_all(content, "\n\n")
        .trim()
        .to_string()
}

fn is_version_heading(line: &str, version: &str) -> bool {
    line.strip_prefix("## [")
        .and_then(|rest| rest.strip_prefix(version))
        .is_some_and(|rest| rest.starts_with(']'))
}

/// Remove a previously inserted section for `version` so re-running never
/// duplicates it.
fn remove_version_section(content: &str, version: &str) -> String {
    let mut kept = String::with_capacity(content.len());
    let mut skipping = false;

    for line in content.split_inclusive('\n') {
        if is_version_heading(line, version) {
            skipping = true;
            continue;
        }

        if skipping && line.starts_with("## ") {
            skipping = false;
        }

        if !skipping {
            kept.push_str(line);
        }
    }

    kept
}

/// Insert `entry` directly below the `# Changelog` heading of `document`,
/// replacing an existing section for the same version.
pub fn insert_entry(document: &str, entry: &str, version: &str) -> String {
    let entry = entry.trim_end();

    let header_end = document
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some((start, line))
        })
        .find(|(_, line)| line.trim_end() == CHANGELOG_HEADER)
        .map(|(start, _)| start + CHANGELOG_HEADER.len());

    let (before, after) = match header_end {
        Some(end) => (&document[..end], &document[end..]),
        None => {
            debug!("no changelog header found: adding one");
            (CHANGELOG_HEADER, document)
        }
    };

    let after = remove_version_section(after, version);
    let after = after.trim_start_matches(['\n', '\r']);

    let mut updated = format!("{before}\n\n{entry}\n");

    if !after.trim().is_empty() {
        updated.push('\n');
        updated.push_str(after);
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
    }

    updated
}

#[cfg(test)]
#[path = "./changelog_tests.rs"]
mod tests;
