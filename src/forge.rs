//! Unified interface for Git forge platforms (GitHub, GitLab).
//!
//! Provides token-based authentication, tag and commit history lookup,
//! pull request association, and release pull request management through
//! common traits.

/// Configuration and authentication for forge platforms.
pub mod config;

/// GitHub API client implementation for GitHub.com and Enterprise.
pub mod github;

/// GitLab extension point.
pub mod gitlab;

/// Lazy pagination over list endpoints.
pub mod pagination;

/// Common traits for forge platform abstraction.
pub mod traits;

/// Shared data types for pull requests and credentials.
pub mod types;
