//! Content updaters applied to the reconciliation branch's working tree.
//!
//! Each updater owns one kind of file. Updaters that find nothing to update
//! are no-ops, so every updater runs on every repository.
use log::*;
use std::path::Path;

use crate::{analyzer::version::NextVersion, result::Result};

mod cargo_toml;
mod changelog;
mod generic;
mod package_json;

pub use cargo_toml::CargoToml;
pub use changelog::ChangelogFile;
pub use generic::{GenericFile, VERSION_MARKER};
pub use package_json::PackageJson;

/// Everything an updater may write into the working tree.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    /// Root of the working tree.
    pub root: &'a Path,
    pub version: &'a NextVersion,
    /// Rendered changelog entry for `version`.
    pub changelog_entry: &'a str,
}

pub trait Updater {
    fn name(&self) -> &'static str;

    /// Apply the update. Returns whether any file was written.
    fn update(&self, ctx: &UpdateContext<'_>) -> Result<bool>;
}

/// Which optional updaters are enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterSet {
    pub cargo: bool,
    pub node: bool,
    /// Files updated through [`VERSION_MARKER`] lines.
    pub extra_files: Vec<String>,
}

impl Default for UpdaterSet {
    fn default() -> Self {
        Self {
            cargo: true,
            node: true,
            extra_files: vec![],
        }
    }
}

impl UpdaterSet {
    /// The changelog updater always runs; the others follow the flags.
    pub fn build(&self) -> Vec<Box<dyn Updater>> {
        let mut updaters: Vec<Box<dyn Updater>> = vec![Box::new(ChangelogFile)];

        if self.cargo {
            updaters.push(Box::new(CargoToml));
        }

        if self.node {
            updaters.push(Box::new(PackageJson));
        }

        if !self.extra_files.is_empty() {
            updaters.push(Box::new(GenericFile::new(self.extra_files.clone())));
        }

        updaters
    }
}

/// Run `updaters` in order, returning the names of those that changed a
/// file.
pub fn run_updaters(
    updaters: &[Box<dyn Updater>],
    ctx: &UpdateContext<'_>,
) -> Result<Vec<&'static str>> {
    let mut applied = vec![];

    for updater in updaters {
        if updater.update(ctx)? {
            info!("{} updated to {}", updater.name(), ctx.version.semver);
            applied.push(updater.name());
        } else {
            debug!("{}: nothing to update", updater.name());
        }
    }

    Ok(applied)
}
