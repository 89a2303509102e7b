use log::*;
use regex::Regex;
use std::{fs, sync::LazyLock};

use crate::{
    result::Result,
    updater::{UpdateContext, Updater},
};

/// Lines containing this marker get their version replaced.
pub const VERSION_MARKER: &str = "x-releaser-pleaser-version";

static SEMVER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?",
    )
    .unwrap()
});

/// Replace the first semantic version on every marked line.
fn replace_marked_versions(content: &str, version: &str) -> String {
    content
        .split_inclusive('\n')
        .map(|line| {
            if line.contains(VERSION_MARKER) {
                SEMVER_REGEX.replace(line, version).to_string()
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// Updates arbitrary files through [`VERSION_MARKER`] comments.
pub struct GenericFile {
    paths: Vec<String>,
}

impl GenericFile {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }
}

impl Updater for GenericFile {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn update(&self, ctx: &UpdateContext<'_>) -> Result<bool> {
        let version = ctx.version.semver.to_string();
        let mut changed = false;

        for file in self.paths.iter() {
            let path = ctx.root.join(file);
            if !path.exists() {
                warn!("configured version file {file} does not exist");
                continue;
            }

            let content = fs::read_to_string(&path)?;
            let updated = replace_marked_versions(&content, &version);

            if updated != content {
                debug!("updated version in {file}");
                fs::write(&path, updated)?;
                changed = true;
            }
        }

        Ok(changed)
    }
}
