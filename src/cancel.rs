//! Cancellation of in-flight forge requests.
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::{error::ReleaserError, result::Result};

/// Race `fut` against `token`, returning [`ReleaserError::Cancelled`] as
/// soon as the token fires. The future is dropped on cancellation, which
/// aborts the underlying HTTP request.
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if token.is_cancelled() {
        return Err(ReleaserError::Cancelled.into());
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ReleaserError::Cancelled.into()),
        result = fut => result,
    }
}

/// Fail fast if the token has already been cancelled.
pub fn check(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        return Err(ReleaserError::Cancelled.into());
    }
    Ok(())
}
