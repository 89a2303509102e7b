use std::fs;

use crate::{
    analyzer::changelog::{CHANGELOG_FILE, insert_entry},
    result::Result,
    updater::{UpdateContext, Updater},
};

/// Inserts the new entry into `CHANGELOG.md`, creating the file when the
/// repository has none.
pub struct ChangelogFile;

impl Updater for ChangelogFile {
    fn name(&self) -> &'static str {
        CHANGELOG_FILE
    }

    fn update(&self, ctx: &UpdateContext<'_>) -> Result<bool> {
        let path = ctx.root.join(CHANGELOG_FILE);

        let existing = if path.exists() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };

        let updated = insert_entry(
            &existing,
            ctx.changelog_entry,
            &ctx.version.tag_name,
        );

        if updated == existing {
            return Ok(false);
        }

        fs::write(&path, updated)?;
        Ok(true)
    }
}
