use log::*;
use std::fs;
use toml_edit::{DocumentMut, value};

use crate::{
    result::Result,
    updater::{UpdateContext, Updater},
};

const CARGO_TOML: &str = "Cargo.toml";

/// Sets `[package].version` in the root `Cargo.toml`.
pub struct CargoToml;

impl Updater for CargoToml {
    fn name(&self) -> &'static str {
        CARGO_TOML
    }

    fn update(&self, ctx: &UpdateContext<'_>) -> Result<bool> {
        let path = ctx.root.join(CARGO_TOML);
        if !path.exists() {
            return Ok(false);
        }

        let content = fs::read_to_string(&path)?;
        let mut doc: DocumentMut = content.parse()?;

        let Some(package) = doc.get_mut("package").and_then(|p| p.as_table_like_mut())
        else {
            debug!("skipping cargo manifest without a package table");
            return Ok(false);
        };

        // `version.workspace = true` inherits from the workspace
        if package
            .get("version")
            .is_some_and(|v| v.as_str().is_none())
        {
            debug!("skipping cargo package with inherited version");
            return Ok(false);
        }

        package.insert("version", value(ctx.version.semver.to_string()));

        let updated = doc.to_string();
        if updated == content {
            return Ok(false);
        }

        fs::write(&path, updated)?;
        Ok(true)
    }
}
