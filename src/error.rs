//! Typed errors for failures callers need to tell apart.

use thiserror::Error;

/// Error type for releaser-pleaser operations.
#[derive(Error, Debug)]
pub enum ReleaserError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("{forge} forge does not implement {operation}")]
    NotImplemented {
        forge: &'static str,
        operation: &'static str,
    },

    #[error("must set {forge} token with a flag or the {variable} environment variable")]
    MissingToken {
        forge: &'static str,
        variable: &'static str,
    },

    #[error("tag '{name}' is not a semantic version")]
    InvalidTag { name: String },

    #[error("git {operation} failed on branch '{branch}': {source}")]
    Git {
        operation: &'static str,
        branch: String,
        #[source]
        source: git2::Error,
    },

    #[error("Forge operation failed: {0}")]
    Forge(String),

    #[error("API rate limit exceeded")]
    RateLimitExceeded,
}

impl ReleaserError {
    /// Create a forge error with context
    pub fn forge(msg: impl Into<String>) -> Self {
        Self::Forge(msg.into())
    }

    /// Wrap a git2 failure with the operation and branch it happened on
    pub fn git(
        operation: &'static str,
        branch: impl Into<String>,
        source: git2::Error,
    ) -> Self {
        Self::Git {
            operation,
            branch: branch.into(),
            source,
        }
    }
}

impl From<octocrab::Error> for ReleaserError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. }
                if source.message.contains("rate limit") =>
            {
                Self::RateLimitExceeded
            }
            _ => Self::Forge(format!("GitHub API error: {}", err)),
        }
    }
}
