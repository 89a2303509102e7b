//! Configuration loading for `releaser-pleaser.toml` and the settings of a
//! single reconciliation run.
use color_eyre::eyre::WrapErr;
use derive_builder::Builder;
use log::*;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{git::Committer, result::Result, updater::UpdaterSet};

/// Default configuration filename, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "releaser-pleaser.toml";

pub const DEFAULT_TAG_PREFIX: &str = "v";

pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Toggles for the built-in version file updaters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdatersConfig {
    /// Update `[package].version` in `Cargo.toml` (default: true)
    pub cargo: bool,
    /// Update `version` in `package.json` (default: true)
    pub node: bool,
}

impl Default for UpdatersConfig {
    fn default() -> Self {
        Self {
            cargo: true,
            node: true,
        }
    }
}

/// Root configuration structure for `releaser-pleaser.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix joined to the semantic version to form tag names.
    pub tag_prefix: String,
    /// Identity used for release commits.
    pub committer: Committer,
    /// Files whose `x-releaser-pleaser-version` lines get the new version.
    pub extra_files: Vec<String>,
    pub updaters: UpdatersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_prefix: DEFAULT_TAG_PREFIX.into(),
            committer: Committer::default(),
            extra_files: vec![],
            updaters: UpdatersConfig::default(),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load `path` when given, otherwise [`DEFAULT_CONFIG_FILE`] if it
    /// exists, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    debug!("no {DEFAULT_CONFIG_FILE} found: using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        info!("loading configuration from {}", path.display());

        let content = fs::read_to_string(&path).wrap_err_with(|| {
            format!("failed to read config file {}", path.display())
        })?;

        Self::parse(&content).wrap_err_with(|| {
            format!("invalid config file {}", path.display())
        })
    }

    pub fn updater_set(&self) -> UpdaterSet {
        UpdaterSet {
            cargo: self.updaters.cargo,
            node: self.updaters.node,
            extra_files: self.extra_files.clone(),
        }
    }
}

/// Everything the orchestrator needs besides its collaborators.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct ReconcileConfig {
    #[builder(default = "DEFAULT_BASE_BRANCH.into()")]
    pub base_branch: String,
    #[builder(default = "DEFAULT_TAG_PREFIX.into()")]
    pub tag_prefix: String,
    #[builder(default)]
    pub committer: Committer,
    #[builder(default)]
    pub updaters: UpdaterSet,
}

impl ReconcileConfig {
    /// Combine the file configuration with the base branch chosen on the
    /// command line.
    pub fn from_config(config: &Config, base_branch: &str) -> Result<Self> {
        let reconcile = ReconcileConfigBuilder::default()
            .base_branch(base_branch)
            .tag_prefix(config.tag_prefix.clone())
            .committer(config.committer.clone())
            .updaters(config.updater_set())
            .build()?;

        Ok(reconcile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tag_prefix, "v");
        assert!(config.updaters.cargo);
        assert!(config.updaters.node);
    }

    #[test]
    fn parses_full_config() {
        let config = Config::parse(
            r#"
tag_prefix = "release-"
extra_files = ["VERSION", "docs/install.md"]

[committer]
name = "Release Bot"

[updaters]
node = false
"#,
        )
        .unwrap();

        assert_eq!(config.tag_prefix, "release-");
        assert_eq!(config.committer.name, "Release Bot");
        assert_eq!(config.committer.email, Committer::default().email);
        assert_eq!(
            config.updater_set(),
            UpdaterSet {
                cargo: true,
                node: false,
                extra_files: vec!["VERSION".into(), "docs/install.md".into()],
            }
        );
    }

    #[test]
    fn rejects_invalid_toml() {
        assert!(Config::parse("tag_prefix = [").is_err());
    }

    #[test]
    fn load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "tag_prefix = \"\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.tag_prefix, "");
    }

    #[test]
    fn load_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn builds_reconcile_config() {
        let config = Config {
            tag_prefix: "app-v".into(),
            ..Config::default()
        };

        let reconcile = ReconcileConfig::from_config(&config, "develop").unwrap();

        assert_eq!(reconcile.base_branch, "develop");
        assert_eq!(reconcile.tag_prefix, "app-v");
        assert_eq!(reconcile.committer, Committer::default());
        assert_eq!(reconcile.updaters, UpdaterSet::default());
    }

    #[test]
    fn builder_defaults() {
        let reconcile = ReconcileConfigBuilder::default().build().unwrap();
        assert_eq!(reconcile.base_branch, DEFAULT_BASE_BRANCH);
        assert_eq!(reconcile.tag_prefix, DEFAULT_TAG_PREFIX);
    }
}
