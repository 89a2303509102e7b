//! Implements the Forge trait for Github
use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::*;
use octocrab::{Octocrab, Page};
use serde::{Deserialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;

use crate::{
    analyzer::{
        commit::{Commit, analyze_commits},
        release::{Changeset, Tag},
    },
    cancel,
    error::ReleaserError,
    forge::{
        config::{
            DEFAULT_LABEL_COLOR, DEFAULT_PAGE_SIZE, PENDING_LABEL, RemoteConfig,
        },
        pagination::{PageResult, collect_all, paginate},
        traits::{Forge, PullRequestUpserter},
        types::{
            CreatePrRequest, GitAuth, ReleasePullRequest, UpdatePrRequest,
        },
    },
    result::Result,
};

pub const DEFAULT_GITHUB_HOST: &str = "github.com";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const GITHUB_USER_VAR: &str = "GITHUB_USER";

#[derive(Debug, Deserialize)]
struct GithubObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GithubTag {
    name: String,
    commit: GithubObject,
}

#[derive(Debug, Deserialize)]
struct GithubCommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GithubCommit {
    sha: String,
    commit: GithubCommitDetail,
}

#[derive(Debug, Deserialize)]
struct GithubComparison {
    total_commits: u64,
    commits: Vec<GithubCommit>,
}

#[derive(Debug, Deserialize)]
struct GithubLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GithubPullRequest {
    number: u64,
    html_url: String,
    title: String,
    body: Option<String>,
    merge_commit_sha: Option<String>,
    #[serde(default)]
    labels: Vec<GithubLabel>,
}

impl From<GithubCommit> for Commit {
    fn from(value: GithubCommit) -> Self {
        Commit::new(value.sha, value.commit.message)
    }
}

impl From<GithubPullRequest> for ReleasePullRequest {
    fn from(value: GithubPullRequest) -> Self {
        ReleasePullRequest {
            id: value.number,
            title: value.title,
            description: value.body.unwrap_or_default(),
            labels: value.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

/// First tag in listing order whose name is a semantic version once
/// `prefix` is stripped.
fn first_release_tag(tags: Vec<GithubTag>, prefix: &str) -> Option<Tag> {
    tags.into_iter()
        .map(|t| Tag::new(t.commit.sha, t.name))
        .find(|tag| match tag.semver(prefix) {
            Ok(_) => true,
            Err(_) => {
                debug!("skipping non release tag: {tag}");
                false
            }
        })
}

/// Only the pull request whose merge commit is `hash` counts. This assumes
/// squash merges; merge-commit and rebase workflows never match.
fn merged_with(
    prs: Vec<GithubPullRequest>,
    hash: &str,
) -> Option<GithubPullRequest> {
    prs.into_iter()
        .find(|pr| pr.merge_commit_sha.as_deref() == Some(hash))
}

fn changeset_for(commit: &Commit, pr: &GithubPullRequest) -> Option<Changeset> {
    let entries = analyze_commits(std::slice::from_ref(commit));
    if entries.is_empty() {
        debug!(
            "commit {} in #{} is not a conventional commit: skipping",
            commit.short_hash(),
            pr.number
        );
        return None;
    }

    Some(Changeset {
        url: pr.html_url.clone(),
        identifier: format!("#{}", pr.number),
        changelog_entries: entries,
    })
}

fn page_params<'a>(
    page: u32,
    filters: &[(&'a str, String)],
) -> Vec<(&'a str, String)> {
    let mut params = vec![
        ("page", page.to_string()),
        ("per_page", DEFAULT_PAGE_SIZE.to_string()),
    ];
    params.extend_from_slice(filters);
    params
}

fn comparison_has_more(page: u32, total_commits: u64) -> bool {
    u64::from(page) * u64::from(DEFAULT_PAGE_SIZE) < total_commits
}

/// GitHub forge implementation using Octocrab for API interactions with
/// commit history, tags, and pull requests.
pub struct Github {
    config: RemoteConfig,
    base_uri: String,
    instance: Octocrab,
}

impl Github {
    /// Create GitHub client with personal access token authentication and API
    /// base URL configuration.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base_uri = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let instance = Octocrab::builder()
            .personal_token(config.token.clone())
            .base_uri(base_uri.clone())?
            .build()?;

        Ok(Self {
            config,
            base_uri,
            instance,
        })
    }

    fn host(&self) -> &str {
        if self.config.host.is_empty() {
            DEFAULT_GITHUB_HOST
        } else {
            &self.config.host
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_uri, self.config.owner, self.config.repo, path
        )
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        filters: &[(&str, String)],
    ) -> Result<Page<T>> {
        let params = page_params(page, filters);

        let result: Page<T> = self
            .instance
            .get(self.endpoint(path), Some(&params))
            .await
            .map_err(ReleaserError::from)?;

        Ok(result)
    }

    async fn list_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        filters: &[(&str, String)],
    ) -> Result<PageResult<T>> {
        let result = self.get_page::<T>(path, page, filters).await?;
        Ok(PageResult {
            has_more: result.next.is_some(),
            items: result.items,
        })
    }

    async fn compare_page(
        &self,
        base: &str,
        page: u32,
    ) -> Result<PageResult<GithubCommit>> {
        let params = page_params(page, &[]);

        let path = format!("compare/{base}...{}", self.config.base_branch);

        let comparison: GithubComparison = self
            .instance
            .get(self.endpoint(&path), Some(&params))
            .await
            .map_err(ReleaserError::from)?;

        debug!(
            "comparison {base}...{} has {} commits",
            self.config.base_branch, comparison.total_commits
        );

        Ok(PageResult {
            has_more: comparison_has_more(page, comparison.total_commits),
            items: comparison.commits,
        })
    }

    async fn ensure_label(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<()> {
        let labels: Vec<GithubLabel> = collect_all(paginate(cancel, |page| {
            self.list_page("labels", page, &[])
        }))
        .await?;

        if labels.iter().any(|l| l.name == name) {
            return Ok(());
        }

        info!("creating label {name}");

        let body = serde_json::json!({
          "name": name,
          "color": DEFAULT_LABEL_COLOR,
        });

        let _: serde_json::Value = cancel::cancellable(cancel, async {
            Ok(self
                .instance
                .post(self.endpoint("labels"), Some(&body))
                .await
                .map_err(ReleaserError::from)?)
        })
        .await?;

        Ok(())
    }

    async fn add_pending_label(
        &self,
        cancel: &CancellationToken,
        pr_number: u64,
    ) -> Result<Vec<String>> {
        self.ensure_label(cancel, PENDING_LABEL).await?;

        let body = serde_json::json!({ "labels": [PENDING_LABEL] });
        let path = format!("issues/{pr_number}/labels");

        let labels: Vec<GithubLabel> = cancel::cancellable(cancel, async {
            Ok(self
                .instance
                .post(self.endpoint(&path), Some(&body))
                .await
                .map_err(ReleaserError::from)?)
        })
        .await?;

        Ok(labels.into_iter().map(|l| l.name).collect())
    }
}

#[async_trait]
impl Forge for Github {
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
        format!("{}/releases/tag/{version}", self.repo_url())
    }

    fn git_auth(&self) -> GitAuth {
        GitAuth {
            username: self.config.username.clone(),
            token: self.config.token.clone(),
        }
    }

    async fn latest_tag(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Tag>> {
        debug!("listing tags in github repository");

        let pages = paginate(cancel, |page| self.list_page("tags", page, &[]));
        let mut pages = std::pin::pin!(pages);

        // tags are listed newest first so the first match wins
        while let Some(tags) = pages.try_next().await? {
            if let Some(tag) = first_release_tag(tags, &self.config.tag_prefix)
            {
                info!("found latest tag: {tag}");
                return Ok(Some(tag));
            }
        }

        info!("no previous release tag found");
        Ok(None)
    }

    async fn commits_since(
        &self,
        cancel: &CancellationToken,
        tag: Option<Tag>,
    ) -> Result<Vec<Commit>> {
        let commits: Vec<GithubCommit> = match &tag {
            Some(tag) => {
                debug!(
                    "comparing commits from {} to {}",
                    tag.hash, self.config.base_branch
                );
                collect_all(paginate(cancel, |page| {
                    self.compare_page(&tag.hash, page)
                }))
                .await?
            }
            None => {
                debug!(
                    "no tag: listing full history of {}",
                    self.config.base_branch
                );
                let filters = [("sha", self.config.base_branch.clone())];
                let mut history: Vec<GithubCommit> =
                    collect_all(paginate(cancel, |page| {
                        self.list_page("commits", page, &filters)
                    }))
                    .await?;
                // history is listed newest first
                history.reverse();
                history
            }
        };

        info!("found {} commits since last release", commits.len());

        Ok(commits.into_iter().map(Commit::from).collect())
    }

    async fn changesets(
        &self,
        cancel: &CancellationToken,
        commits: Vec<Commit>,
    ) -> Result<Vec<Changeset>> {
        let mut changesets = Vec::with_capacity(commits.len());

        for commit in commits {
            cancel::check(cancel)?;

            debug!(
                "fetching pull requests associated with commit {}",
                commit.short_hash()
            );

            let path = format!("commits/{}/pulls", commit.hash);
            let prs: Vec<GithubPullRequest> =
                collect_all(paginate(cancel, |page| {
                    self.list_page(&path, page, &[])
                }))
                .await?;

            let Some(pr) = merged_with(prs, &commit.hash) else {
                warn!(
                    "did not find associated pull request for commit {}: not considering it for changesets",
                    commit.short_hash()
                );
                continue;
            };

            if let Some(changeset) = changeset_for(&commit, &pr) {
                changesets.push(changeset);
            }
        }

        Ok(changesets)
    }

    async fn pull_request_for_branch(
        &self,
        cancel: &CancellationToken,
        branch: &str,
    ) -> Result<Option<ReleasePullRequest>> {
        let filters = [
            ("state", "open".to_string()),
            ("head", format!("{}:{branch}", self.config.owner)),
            ("base", self.config.base_branch.clone()),
        ];

        let pages =
            paginate(cancel, |page| self.list_page("pulls", page, &filters));
        let mut pages = std::pin::pin!(pages);

        let first: Option<GithubPullRequest> = match pages.try_next().await? {
            Some(prs) => prs.into_iter().next(),
            None => None,
        };

        match first {
            Some(pr) => {
                info!("found open release pull request #{}", pr.number);
                Ok(Some(pr.into()))
            }
            None => {
                info!("no open release pull request for {branch}");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl PullRequestUpserter for Github {
    async fn create_pull_request(
        &self,
        cancel: &CancellationToken,
        req: CreatePrRequest,
    ) -> Result<ReleasePullRequest> {
        let body = serde_json::json!({
          "title": req.title,
          "head": req.head_branch,
          "base": req.base_branch,
          "body": req.body,
        });

        let pr: GithubPullRequest = cancel::cancellable(cancel, async {
            Ok(self
                .instance
                .post(self.endpoint("pulls"), Some(&body))
                .await
                .map_err(ReleaserError::from)?)
        })
        .await?;

        info!("created release pull request #{}", pr.number);

        let labels = self.add_pending_label(cancel, pr.number).await?;

        let mut created: ReleasePullRequest = pr.into();
        created.labels = labels;
        Ok(created)
    }

    async fn update_pull_request(
        &self,
        cancel: &CancellationToken,
        req: UpdatePrRequest,
    ) -> Result<ReleasePullRequest> {
        let body = serde_json::json!({
          "title": req.title,
          "body": req.body,
        });
        let path = format!("pulls/{}", req.pr_number);

        let pr: GithubPullRequest = cancel::cancellable(cancel, async {
            Ok(self
                .instance
                .patch(self.endpoint(&path), Some(&body))
                .await
                .map_err(ReleaserError::from)?)
        })
        .await?;

        info!("updated release pull request #{}", pr.number);

        let mut updated: ReleasePullRequest = pr.into();
        if !updated.labels.iter().any(|l| l == PENDING_LABEL) {
            updated.labels = self.add_pending_label(cancel, req.pr_number).await?;
        }
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "./github_tests.rs"]
mod tests;
