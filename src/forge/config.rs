//! Configuration for Git forge platform connections.
use secrecy::SecretString;
use std::sync::Arc;

/// Default page size for paginated list queries
pub const DEFAULT_PAGE_SIZE: u8 = 100;
/// Prefix of the reconciliation branch; the base branch name follows it.
pub const RELEASE_BRANCH_PREFIX: &str = "releaser-pleaser--branches--";
/// Label applied to release PRs while waiting for merge.
pub const PENDING_LABEL: &str = "rp-release::pending";
/// Default color for releaser-pleaser labels in hex format.
pub const DEFAULT_LABEL_COLOR: &str = "dedede";
/// Git username used with token authentication when none is configured.
pub const DEFAULT_GIT_USERNAME: &str = "oauth2";

use crate::{
    forge::{
        github::Github,
        gitlab::Gitlab,
        traits::{Forge, PullRequestUpserter},
    },
    result::Result,
};

/// Name of the branch that stages the next release of `base_branch`.
pub fn release_branch(base_branch: &str) -> String {
    format!("{RELEASE_BRANCH_PREFIX}{base_branch}")
}

/// Remote repository connection configuration for authenticating and
/// interacting with forge platforms.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Web host (e.g., "github.com").
    pub host: String,
    /// API base URL; platform default when `None`.
    pub api_url: Option<String>,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch releases are cut from.
    pub base_branch: String,
    /// Prefix in front of the semantic version in tag names.
    pub tag_prefix: String,
    /// Access token for authentication.
    pub token: SecretString,
    /// Username paired with `token` for git operations.
    pub username: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "".to_string(),
            api_url: None,
            owner: "".to_string(),
            repo: "".to_string(),
            base_branch: "main".to_string(),
            tag_prefix: "v".to_string(),
            token: SecretString::from("".to_string()),
            username: DEFAULT_GIT_USERNAME.to_string(),
        }
    }
}

/// Read and write handles onto the same forge.
pub struct ForgeClients {
    pub forge: Arc<dyn Forge>,
    pub pulls: Arc<dyn PullRequestUpserter>,
}

#[derive(Debug, Clone)]
/// Supported Git forge platforms.
pub enum Remote {
    Github(RemoteConfig),
    Gitlab(RemoteConfig),
}

impl Remote {
    /// Create forge client instances for the configured platform.
    pub async fn get_forge(&self) -> Result<ForgeClients> {
        match self {
            Remote::Github(config) => {
                let forge = Arc::new(Github::new(config.clone())?);
                Ok(ForgeClients {
                    forge: forge.clone(),
                    pulls: forge,
                })
            }
            Remote::Gitlab(config) => {
                let forge = Arc::new(Gitlab::new(config.clone()));
                Ok(ForgeClients {
                    forge: forge.clone(),
                    pulls: forge,
                })
            }
        }
    }

    pub fn config(&self) -> &RemoteConfig {
        match self {
            Remote::Github(config) | Remote::Gitlab(config) => config,
        }
    }
}
