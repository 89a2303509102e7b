//! Traits related to remote git forges
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    analyzer::{
        commit::Commit,
        release::{Changeset, Tag},
    },
    forge::types::{
        CreatePrRequest, GitAuth, ReleasePullRequest, UpdatePrRequest,
    },
    result::Result,
};

/// Read capabilities the reconciliation engine needs from a forge. New
/// platforms are supported by implementing this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    /// Web URL of the repository.
    fn repo_url(&self) -> String;
    /// URL used to clone the repository over HTTPS.
    fn clone_url(&self) -> String;
    /// Web URL of the release for `version` (a tag name).
    fn release_url(&self, version: &str) -> String;
    fn git_auth(&self) -> GitAuth;

    /// The most recent release tag on the base branch, or `None` if the
    /// repository has never been released.
    async fn latest_tag(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Tag>>;

    /// Commits on the base branch after `tag`, oldest first. Without a tag
    /// the full history of the base branch is returned.
    async fn commits_since(
        &self,
        cancel: &CancellationToken,
        tag: Option<Tag>,
    ) -> Result<Vec<Commit>>;

    /// Look up the pull request each commit was merged with. Commits
    /// without one are reported and skipped.
    async fn changesets(
        &self,
        cancel: &CancellationToken,
        commits: Vec<Commit>,
    ) -> Result<Vec<Changeset>>;

    /// The open pull request from `branch` into the base branch, if any.
    async fn pull_request_for_branch(
        &self,
        cancel: &CancellationToken,
        branch: &str,
    ) -> Result<Option<ReleasePullRequest>>;
}

/// Write side of release pull request management.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestUpserter: Send + Sync {
    async fn create_pull_request(
        &self,
        cancel: &CancellationToken,
        req: CreatePrRequest,
    ) -> Result<ReleasePullRequest>;

    async fn update_pull_request(
        &self,
        cancel: &CancellationToken,
        req: UpdatePrRequest,
    ) -> Result<ReleasePullRequest>;
}
