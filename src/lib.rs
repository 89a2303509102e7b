//! releaser-pleaser keeps one release pull request per base branch up to
//! date with the next semantic version and changelog derived from the
//! conventional commits merged since the last release.
pub mod analyzer;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod forge;
pub mod git;
pub mod markdown;
pub mod orchestrator;
pub mod overrides;
pub mod result;
pub mod templates;
pub mod updater;

pub use error::ReleaserError;
pub use orchestrator::{ReconcileOutcome, Reconciler};
pub use result::Result;
