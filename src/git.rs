//! Version control operations the reconciliation engine needs, backed by
//! `git2`.
use color_eyre::eyre::{OptionExt, WrapErr};
use git2::{BranchType, RemoteCallbacks, build::CheckoutBuilder};
use log::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{error::ReleaserError, forge::types::GitAuth, result::Result};

/// Name of the remote a clone pushes to.
pub const DEFAULT_REMOTE: &str = "origin";

/// Identity recorded on release commits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

impl Default for Committer {
    fn default() -> Self {
        Self {
            name: "releaser-pleaser".into(),
            email: "releaser-pleaser@users.noreply.github.com".into(),
        }
    }
}

/// A local clone with a working tree.
#[cfg_attr(test, mockall::automock)]
pub trait VersionControl: Send {
    fn workdir(&self) -> Result<PathBuf>;
    fn local_branches(&self) -> Result<Vec<String>>;
    fn delete_local_branch(&self, branch: &str) -> Result<()>;
    /// Create `branch` at the tip of `base` on the remote and check it out,
    /// replacing the working tree contents.
    fn checkout_new_branch(&self, branch: &str, base: &str) -> Result<()>;
    /// Stage every change in the working tree and commit it. Returns the new
    /// commit hash.
    fn commit_all(&self, message: &str, committer: &Committer) -> Result<String>;
    /// Push `branch` to the same ref name on `remote`, overwriting it.
    fn force_push(&self, remote: &str, branch: &str, auth: &GitAuth) -> Result<()>;
}

/// Produces a [`VersionControl`] for a remote repository.
#[cfg_attr(test, mockall::automock)]
pub trait RepositoryCloner: Send + Sync {
    fn clone_repo(
        &self,
        url: &str,
        path: &Path,
        auth: &GitAuth,
    ) -> Result<Box<dyn VersionControl>>;
}

fn get_auth_callbacks<'r>(auth: &GitAuth) -> RemoteCallbacks<'r> {
    let user = auth.username.clone();
    let token = auth.password().to_string();

    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(move |_url, _username, _allowed| {
        git2::Cred::userpass_plaintext(&user, &token)
    });
    callbacks
}

/// Clones over HTTPS with token authentication.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Cloner;

impl RepositoryCloner for Git2Cloner {
    fn clone_repo(
        &self,
        url: &str,
        path: &Path,
        auth: &GitAuth,
    ) -> Result<Box<dyn VersionControl>> {
        info!("cloning {url} into {}", path.display());

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(get_auth_callbacks(auth));

        let repo = git2::build::RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, path)
            .wrap_err_with(|| format!("failed to clone {url}"))?;

        Ok(Box::new(Repository { repo }))
    }
}

/// [`VersionControl`] over a `git2` repository.
pub struct Repository {
    repo: git2::Repository,
}

impl VersionControl for Repository {
    fn workdir(&self) -> Result<PathBuf> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_eyre("repository has no working directory")?;
        Ok(workdir.to_path_buf())
    }

    fn local_branches(&self) -> Result<Vec<String>> {
        let mut names = vec![];

        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    fn delete_local_branch(&self, branch: &str) -> Result<()> {
        debug!("deleting local branch {branch}");

        let mut local = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|e| ReleaserError::git("find branch", branch, e))?;

        // the checked out branch cannot be deleted
        if local.is_head() {
            let head = self.repo.head()?.peel_to_commit()?;
            self.repo
                .set_head_detached(head.id())
                .map_err(|e| ReleaserError::git("detach head", branch, e))?;
        }

        local
            .delete()
            .map_err(|e| ReleaserError::git("delete branch", branch, e))?;

        Ok(())
    }

    fn checkout_new_branch(&self, branch: &str, base: &str) -> Result<()> {
        info!("creating branch {branch} from {DEFAULT_REMOTE}/{base}");

        let base_ref = format!("refs/remotes/{DEFAULT_REMOTE}/{base}");
        let base_commit = self
            .repo
            .revparse_single(&base_ref)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| ReleaserError::git("resolve base", base, e))?;

        self.repo
            .branch(branch, &base_commit, true)
            .map_err(|e| ReleaserError::git("create branch", branch, e))?;

        let ref_name = format!("refs/heads/{branch}");
        let target = self.repo.revparse_single(&ref_name)?;

        self.repo
            .checkout_tree(&target, Some(CheckoutBuilder::new().force()))
            .map_err(|e| ReleaserError::git("checkout", branch, e))?;
        self.repo
            .set_head(&ref_name)
            .map_err(|e| ReleaserError::git("checkout", branch, e))?;

        Ok(())
    }

    fn commit_all(&self, message: &str, committer: &Committer) -> Result<String> {
        debug!("committing changes with msg: {message}");

        let mut index = self.repo.index()?;
        index.add_all(["*"], git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;

        let oid = index.write_tree()?;
        let tree = self.repo.find_tree(oid)?;
        let head = self.repo.head()?;
        let branch = head.shorthand().unwrap_or("HEAD").to_string();
        let parent = head.peel_to_commit()?;

        let signature = git2::Signature::now(&committer.name, &committer.email)?;

        let commit = self
            .repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &[&parent],
            )
            .map_err(|e| ReleaserError::git("commit", branch, e))?;

        Ok(commit.to_string())
    }

    fn force_push(&self, remote: &str, branch: &str, auth: &GitAuth) -> Result<()> {
        let mut callbacks = get_auth_callbacks(auth);
        callbacks.push_update_reference(|refname, status| match status {
            Some(msg) => Err(git2::Error::from_str(&format!(
                "remote rejected {refname}: {msg}"
            ))),
            None => Ok(()),
        });

        let mut push_opts = git2::PushOptions::new();
        push_opts.remote_callbacks(callbacks);

        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaserError::git("find remote", branch, e))?;

        // + indicates "force" push; the remote ref must be the local branch
        // name rather than a remote tracking ref
        let ref_spec = format!("+refs/heads/{branch}:refs/heads/{branch}");
        debug!("pushing with refspec {ref_spec}");

        remote
            .push(&[ref_spec], Some(&mut push_opts))
            .map_err(|e| ReleaserError::git("push", branch, e))?;

        info!("pushed branch {branch}");

        Ok(())
    }
}
