use git_conventional::Commit as ConventionalCommit;
use log::*;
use serde::Serialize;
use std::fmt::Display;

/// A raw commit on the base branch as returned by a forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub message: String,
}

impl Commit {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
        }
    }

    /// First eight characters of the hash, used in log output.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }
}

/// Release-relevant category of a conventional commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitType {
    Feat,
    Fix,
    /// Any other conventional type (`chore`, `docs`, `ci`, ...). Kept so it
    /// can still drive a breaking bump but never rendered in the changelog.
    Other(String),
}

impl Serialize for CommitType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<&str> for CommitType {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "feat" => CommitType::Feat,
            "fix" => CommitType::Fix,
            other => CommitType::Other(other.to_string()),
        }
    }
}

impl Display for CommitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitType::Feat => f.write_str("feat"),
            CommitType::Fix => f.write_str("fix"),
            CommitType::Other(other) => f.write_str(other),
        }
    }
}

/// Conventional-commit classification of a single [`Commit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzedCommit {
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    pub scope: Option<String>,
    pub breaking: bool,
    pub description: String,
    #[serde(skip)]
    pub source: Commit,
}

impl AnalyzedCommit {
    /// Parse a commit message as a conventional commit. Returns `None` for
    /// messages that do not follow the `type(scope)!: description` grammar.
    pub fn parse(commit: &Commit) -> Option<Self> {
        match ConventionalCommit::parse(commit.message.trim_end()) {
            Ok(cc) => Some(Self {
                commit_type: CommitType::from(cc.type_().as_str()),
                scope: cc.scope().map(|s| s.as_str().to_string()),
                breaking: cc.breaking(),
                description: cc.description().to_string(),
                source: commit.clone(),
            }),
            Err(err) => {
                debug!(
                    "skipping non-conventional commit {}: {err}",
                    commit.short_hash()
                );
                None
            }
        }
    }
}

/// Classify an ordered sequence of commits, dropping the ones that are not
/// conventional commits. Order is preserved and nothing is deduplicated.
pub fn analyze_commits(commits: &[Commit]) -> Vec<AnalyzedCommit> {
    commits.iter().filter_map(AnalyzedCommit::parse).collect()
}
