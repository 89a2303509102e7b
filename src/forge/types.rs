use secrecy::{ExposeSecret, SecretString};

/// The open release pull request for the reconciliation branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePullRequest {
    /// Platform number used to address the pull request.
    pub id: u64,
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
}

/// Credentials injected into clone and push operations.
#[derive(Debug, Clone)]
pub struct GitAuth {
    pub username: String,
    pub token: SecretString,
}

impl GitAuth {
    /// Token as plain text for handing to git credential callbacks.
    pub fn password(&self) -> &str {
        self.token.expose_secret()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrRequest {
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePrRequest {
    pub pr_number: u64,
    pub title: String,
    pub body: String,
}
