//! CLI argument parsing and forge platform configuration.
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{WrapErr, eyre};
use secrecy::SecretString;
use std::{env, path::PathBuf};
use url::Url;

use crate::{
    config::{Config, DEFAULT_BASE_BRANCH},
    error::ReleaserError,
    forge::{
        config::{DEFAULT_GIT_USERNAME, Remote, RemoteConfig},
        github::{DEFAULT_GITHUB_HOST, GITHUB_TOKEN_VAR, GITHUB_USER_VAR},
        gitlab::{DEFAULT_GITLAB_HOST, GITLAB_TOKEN_VAR, GITLAB_USER_VAR},
    },
    result::Result,
};

/// Forge platforms a repository can be hosted on.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgeKind {
    Github,
    Gitlab,
}

impl ForgeKind {
    fn name(&self) -> &'static str {
        match self {
            ForgeKind::Github => "github",
            ForgeKind::Gitlab => "gitlab",
        }
    }

    fn default_host(&self) -> &'static str {
        match self {
            ForgeKind::Github => DEFAULT_GITHUB_HOST,
            ForgeKind::Gitlab => DEFAULT_GITLAB_HOST,
        }
    }

    fn token_var(&self) -> &'static str {
        match self {
            ForgeKind::Github => GITHUB_TOKEN_VAR,
            ForgeKind::Gitlab => GITLAB_TOKEN_VAR,
        }
    }

    fn user_var(&self) -> &'static str {
        match self {
            ForgeKind::Github => GITHUB_USER_VAR,
            ForgeKind::Gitlab => GITLAB_USER_VAR,
        }
    }
}

/// Global CLI arguments for forge configuration and debugging.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Reconciliation subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bring the release pull request up to date with the base branch.
    Run(RunArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, value_enum, default_value_t = ForgeKind::Github)]
    /// Forge hosting the repository.
    pub forge: ForgeKind,

    #[arg(long)]
    /// Repository owner or group.
    pub owner: String,

    #[arg(long)]
    /// Repository name.
    pub repo: String,

    #[arg(long, default_value = DEFAULT_BASE_BRANCH)]
    /// Branch releases are cut from.
    pub branch: String,

    #[arg(long)]
    /// Web host of a self-hosted forge. Defaults to the public instance.
    pub host: Option<String>,

    #[arg(long)]
    /// API base URL of a self-hosted forge.
    pub api_url: Option<String>,

    #[arg(long, default_value = "")]
    /// Access token. Falls back to GITHUB_TOKEN / GITLAB_TOKEN.
    pub token: String,

    #[arg(long)]
    /// Configuration file. Defaults to releaser-pleaser.toml if present.
    pub config: Option<PathBuf>,

    #[arg(long)]
    /// Abort the run after this many seconds.
    pub timeout: Option<u64>,
}

/// Pick the flag value, then the environment value.
fn resolve_token(
    kind: ForgeKind,
    flag: &str,
    from_env: Option<String>,
) -> Result<SecretString> {
    let token = if flag.is_empty() {
        from_env.unwrap_or_default()
    } else {
        flag.to_string()
    };

    if token.is_empty() {
        return Err(ReleaserError::MissingToken {
            forge: kind.name(),
            variable: kind.token_var(),
        }
        .into());
    }

    Ok(SecretString::from(token))
}

/// Only http and https API URLs are accepted. Trailing slashes are dropped.
fn validate_api_url(api_url: &str) -> Result<String> {
    let parsed = Url::parse(api_url)
        .wrap_err_with(|| format!("invalid api url: {api_url}"))?;

    match parsed.scheme() {
        "http" | "https" => {
            Ok(parsed.as_str().trim_end_matches('/').to_string())
        }
        _ => Err(eyre!("only http and https schemes are supported for api urls")),
    }
}

fn resolve_username(from_env: Option<String>) -> String {
    from_env
        .filter(|user| !user.is_empty())
        .unwrap_or_else(|| DEFAULT_GIT_USERNAME.to_string())
}

impl RunArgs {
    /// Configure remote repository connection from CLI arguments and the
    /// environment.
    pub fn get_remote(&self, config: &Config) -> Result<Remote> {
        let kind = self.forge;

        self.build_remote(
            config,
            resolve_token(kind, &self.token, env::var(kind.token_var()).ok())?,
            resolve_username(env::var(kind.user_var()).ok()),
        )
    }

    fn build_remote(
        &self,
        config: &Config,
        token: SecretString,
        username: String,
    ) -> Result<Remote> {
        let remote_config = RemoteConfig {
            host: self
                .host
                .clone()
                .unwrap_or_else(|| self.forge.default_host().to_string()),
            api_url: self
                .api_url
                .as_deref()
                .map(validate_api_url)
                .transpose()?,
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            base_branch: self.branch.clone(),
            tag_prefix: config.tag_prefix.clone(),
            token,
            username,
        };

        match self.forge {
            ForgeKind::Github => Ok(Remote::Github(remote_config)),
            ForgeKind::Gitlab => Ok(Remote::Gitlab(remote_config)),
        }
    }
}
