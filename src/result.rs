//! Result type used throughout releaser-pleaser.
//!
//! Every fallible operation returns [`Result`], a thin alias over
//! `color_eyre::eyre::Result`. Errors pick up context as they propagate
//! with `.wrap_err()`, so a failure deep inside a forge call or a git
//! operation surfaces with the reconciliation stage that triggered it.
//!
//! ```rust,ignore
//! use color_eyre::eyre::WrapErr;
//! use crate::result::Result;
//!
//! fn read_changelog(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .wrap_err_with(|| format!("failed to read {}", path.display()))
//! }
//! ```
//!
//! Failures a caller needs to match on are modelled as
//! [`crate::error::ReleaserError`] and can be recovered from a report with
//! `report.downcast_ref::<ReleaserError>()`.

use color_eyre::eyre::Result as EyreResult;

/// Standard result type used throughout releaser-pleaser.
pub type Result<T> = EyreResult<T>;
