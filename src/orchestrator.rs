//! Reconciliation of the release pull request with the base branch.
//!
//! One [`Reconciler::run`] walks the stages in [`Stage`] order. Any stage
//! failing ends the run with an error naming that stage. Nothing is
//! retried: the next run discards the reconciliation branch and rebuilds
//! it from the base branch tip, which repairs whatever a failed run left
//! behind.
use color_eyre::eyre::WrapErr;
use log::*;
use std::{fmt::Display, sync::Arc};
use tempfile::TempDir;
use tokio::task;
use tokio_util::sync::CancellationToken;

use crate::{
    analyzer::{
        Analyzer, Release,
        release::{Changeset, Tag},
        version::NextVersion,
    },
    cancel,
    config::ReconcileConfig,
    forge::{
        config::{ForgeClients, release_branch},
        traits::{Forge, PullRequestUpserter},
        types::{CreatePrRequest, ReleasePullRequest, UpdatePrRequest},
    },
    git::{DEFAULT_REMOTE, RepositoryCloner, VersionControl},
    overrides::{ReleaseOverrides, render_description},
    result::Result,
    templates::Templates,
    updater::{UpdateContext, run_updaters},
};

/// Run blocking git or filesystem work on the blocking pool. The run stops
/// waiting as soon as `cancel` fires; work already started finishes on its
/// own thread.
async fn run_blocking<T, F>(cancel: &CancellationToken, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    cancel::cancellable(cancel, async move {
        task::spawn_blocking(work).await?
    })
    .await
}

/// Steps of a reconciliation run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GatherForgeState,
    ComputeTarget,
    PreparePendingBranch,
    ApplyUpdaters,
    CommitAndPush,
    UpsertPullRequest,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::GatherForgeState => "gather forge state",
            Stage::ComputeTarget => "compute target",
            Stage::PreparePendingBranch => "prepare pending branch",
            Stage::ApplyUpdaters => "apply updaters",
            Stage::CommitAndPush => "commit and push",
            Stage::UpsertPullRequest => "upsert pull request",
        };
        f.write_str(name)
    }
}

fn stage_failed(stage: Stage) -> String {
    format!("reconciliation failed during {stage}")
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No releasable change since the last tag. Any open release pull
    /// request was left as is.
    NothingToRelease,
    Reconciled {
        version: NextVersion,
        /// Hash of the release commit on the reconciliation branch.
        commit: String,
        pull_request: ReleasePullRequest,
    },
}

/// What the forge knows about the base branch.
#[derive(Debug)]
struct ForgeState {
    tag: Option<Tag>,
    changesets: Vec<Changeset>,
    pull_request: Option<ReleasePullRequest>,
}

/// The release the pull request should propose.
#[derive(Debug)]
struct Target {
    release: Release,
    overrides: ReleaseOverrides,
    title: String,
}

/// A clone checked out on the reconciliation branch. The clone is closed
/// before its directory is removed.
struct Workspace {
    vcs: Box<dyn VersionControl>,
    _dir: TempDir,
}

pub struct Reconciler {
    config: ReconcileConfig,
    forge: Arc<dyn Forge>,
    pulls: Arc<dyn PullRequestUpserter>,
    cloner: Arc<dyn RepositoryCloner>,
    templates: &'static Templates,
}

impl Reconciler {
    pub fn new(
        config: ReconcileConfig,
        clients: ForgeClients,
        cloner: Box<dyn RepositoryCloner>,
        templates: &'static Templates,
    ) -> Self {
        Self {
            config,
            forge: clients.forge,
            pulls: clients.pulls,
            cloner: Arc::from(cloner),
            templates,
        }
    }

    fn branch(&self) -> String {
        release_branch(&self.config.base_branch)
    }

    /// Perform one full reconciliation pass.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome> {
        let state = self
            .gather_forge_state(cancel)
            .await
            .wrap_err_with(|| stage_failed(Stage::GatherForgeState))?;

        let Some(target) = self
            .compute_target(&state)
            .wrap_err_with(|| stage_failed(Stage::ComputeTarget))?
        else {
            info!(
                "nothing to release on {}: leaving release pull request untouched",
                self.config.base_branch
            );
            return Ok(ReconcileOutcome::NothingToRelease);
        };

        let workspace = self
            .prepare_pending_branch(cancel)
            .await
            .wrap_err_with(|| stage_failed(Stage::PreparePendingBranch))?;

        let workspace = self
            .apply_updaters(cancel, workspace, &target.release)
            .await
            .wrap_err_with(|| stage_failed(Stage::ApplyUpdaters))?;

        let commit = self
            .commit_and_push(cancel, workspace, &target)
            .await
            .wrap_err_with(|| stage_failed(Stage::CommitAndPush))?;

        let pull_request = self
            .upsert_pull_request(cancel, state.pull_request, &target)
            .await
            .wrap_err_with(|| stage_failed(Stage::UpsertPullRequest))?;

        info!(
            "release pull request #{} proposes {}",
            pull_request.id, target.release.version.tag_name
        );

        Ok(ReconcileOutcome::Reconciled {
            version: target.release.version,
            commit,
            pull_request,
        })
    }

    async fn gather_forge_state(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ForgeState> {
        cancel::check(cancel)?;

        let tag = self.forge.latest_tag(cancel).await?;
        match &tag {
            Some(tag) => info!("latest release: {tag}"),
            None => info!("no previous release found"),
        }

        let commits = self.forge.commits_since(cancel, tag.clone()).await?;
        info!("found {} commits since last release", commits.len());

        let changesets = self.forge.changesets(cancel, commits).await?;
        debug!("found {} changesets", changesets.len());

        let pull_request = self
            .forge
            .pull_request_for_branch(cancel, &self.branch())
            .await?;

        if let Some(pr) = &pull_request {
            info!("found open release pull request #{}", pr.id);
        }

        Ok(ForgeState {
            tag,
            changesets,
            pull_request,
        })
    }

    fn compute_target(&self, state: &ForgeState) -> Result<Option<Target>> {
        let overrides = state
            .pull_request
            .as_ref()
            .map(|pr| ReleaseOverrides::from_description(&pr.description))
            .unwrap_or_default();

        let analyzer = Analyzer::new(self.templates, &self.config.tag_prefix);

        let release = analyzer.analyze(
            state.tag.as_ref(),
            &state.changesets,
            &overrides,
            |tag_name| self.forge.release_url(tag_name),
        )?;

        Ok(release.map(|release| Target {
            title: format!(
                "chore({}): release {}",
                self.config.base_branch, release.version.tag_name
            ),
            release,
            overrides,
        }))
    }

    async fn prepare_pending_branch(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Workspace> {
        cancel::check(cancel)?;

        let cloner = Arc::clone(&self.cloner);
        let url = self.forge.clone_url();
        let auth = self.forge.git_auth();
        let branch = self.branch();
        let base = self.config.base_branch.clone();

        run_blocking(cancel, move || {
            let dir = TempDir::new()?;
            let vcs = cloner.clone_repo(&url, dir.path(), &auth)?;

            if vcs.local_branches()?.contains(&branch) {
                info!("discarding stale local branch {branch}");
                vcs.delete_local_branch(&branch)?;
            }

            vcs.checkout_new_branch(&branch, &base)?;

            Ok(Workspace { vcs, _dir: dir })
        })
        .await
    }

    async fn apply_updaters(
        &self,
        cancel: &CancellationToken,
        workspace: Workspace,
        release: &Release,
    ) -> Result<Workspace> {
        cancel::check(cancel)?;

        let updaters = self.config.updaters.clone();
        let version = release.version.clone();
        let notes = release.notes.clone();

        run_blocking(cancel, move || {
            let root = workspace.vcs.workdir()?;

            let ctx = UpdateContext {
                root: &root,
                version: &version,
                changelog_entry: &notes,
            };

            let applied = run_updaters(&updaters.build(), &ctx)?;
            debug!("updated files: {applied:?}");

            Ok(workspace)
        })
        .await
    }

    async fn commit_and_push(
        &self,
        cancel: &CancellationToken,
        workspace: Workspace,
        target: &Target,
    ) -> Result<String> {
        cancel::check(cancel)?;

        let branch = self.branch();
        let title = target.title.clone();
        let committer = self.config.committer.clone();
        let auth = self.forge.git_auth();

        run_blocking(cancel, move || {
            let vcs = workspace.vcs.as_ref();

            let commit = vcs.commit_all(&title, &committer)?;
            info!("created release commit {commit} on {branch}");

            vcs.force_push(DEFAULT_REMOTE, &branch, &auth).wrap_err_with(
                || format!("failed to push commit {commit} to {branch}"),
            )?;

            Ok(commit)
        })
        .await
    }

    async fn upsert_pull_request(
        &self,
        cancel: &CancellationToken,
        existing: Option<ReleasePullRequest>,
        target: &Target,
    ) -> Result<ReleasePullRequest> {
        cancel::check(cancel)?;

        let body = render_description(
            self.templates,
            existing.as_ref().map(|pr| pr.description.as_str()),
            &target.release.notes,
            &target.overrides,
        )?;

        match existing {
            Some(pr) => {
                info!("updating release pull request #{}", pr.id);
                self.pulls
                    .update_pull_request(
                        cancel,
                        UpdatePrRequest {
                            pr_number: pr.id,
                            title: target.title.clone(),
                            body,
                        },
                    )
                    .await
            }
            None => {
                info!("opening release pull request");
                self.pulls
                    .create_pull_request(
                        cancel,
                        CreatePrRequest {
                            head_branch: self.branch(),
                            base_branch: self.config.base_branch.clone(),
                            title: target.title.clone(),
                            body,
                        },
                    )
                    .await
            }
        }
    }
}
