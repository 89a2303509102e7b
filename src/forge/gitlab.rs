//! GitLab forge. Repository URLs work; every API operation fails fast with
//! [`ReleaserError::NotImplemented`] until an API client is wired in.
use async_trait::async_trait;
use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    analyzer::{
        commit::Commit,
        release::{Changeset, Tag},
    },
    error::ReleaserError,
    forge::{
        config::RemoteConfig,
        traits::{Forge, PullRequestUpserter},
        types::{
            CreatePrRequest, GitAuth, ReleasePullRequest, UpdatePrRequest,
        },
    },
    result::Result,
};

pub const DEFAULT_GITLAB_HOST: &str = "gitlab.com";
pub const GITLAB_TOKEN_VAR: &str = "GITLAB_TOKEN";
pub const GITLAB_USER_VAR: &str = "GITLAB_USER";

const FORGE: &str = "gitlab";

fn not_implemented<T>(operation: &'static str) -> Result<T> {
    error!("{FORGE} does not support {operation} yet");
    Err(ReleaserError::NotImplemented {
        forge: FORGE,
        operation,
    }
    .into())
}

pub struct Gitlab {
    config: RemoteConfig,
}

impl Gitlab {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    fn host(&self) -> &str {
        if self.config.host.is_empty() {
            DEFAULT_GITLAB_HOST
        } else {
            &self.config.host
        }
    }
}

#[async_trait]
impl Forge for Gitlab {
    fn repo_url(&self) -> String {
        format!(
            "https://{}/{}/{}",
            self.host(),
            self.config.owner,
            self.config.repo
        )
    }

    fn clone_url(&self) -> String {
        format!("{}.git", self.repo_url())
    }

    fn release_url(&self, version: &str) -> String {
        format!("{}/-/releases/{version}", self.repo_url())
    }

    fn git_auth(&self) -> GitAuth {
        GitAuth {
            username: self.config.username.clone(),
            token: self.config.token.clone(),
        }
    }

    async fn latest_tag(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Option<Tag>> {
        not_implemented("latest_tag")
    }

    async fn commits_since(
        &self,
        _cancel: &CancellationToken,
        _tag: Option<Tag>,
    ) -> Result<Vec<Commit>> {
        not_implemented("commits_since")
    }

    async fn changesets(
        &self,
        _cancel: &CancellationToken,
        _commits: Vec<Commit>,
    ) -> Result<Vec<Changeset>> {
        not_implemented("changesets")
    }

    async fn pull_request_for_branch(
        &self,
        _cancel: &CancellationToken,
        _branch: &str,
    ) -> Result<Option<ReleasePullRequest>> {
        not_implemented("pull_request_for_branch")
    }
}

#[async_trait]
impl PullRequestUpserter for Gitlab {
    async fn create_pull_request(
        &self,
        _cancel: &CancellationToken,
        _req: CreatePrRequest,
    ) -> Result<ReleasePullRequest> {
        not_implemented("create_pull_request")
    }

    async fn update_pull_request(
        &self,
        _cancel: &CancellationToken,
        _req: UpdatePrRequest,
    ) -> Result<ReleasePullRequest> {
        not_implemented("update_pull_request")
    }
}
