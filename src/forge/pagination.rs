//! Lazy page-by-page iteration over list-style forge endpoints.
use futures_util::{Stream, TryStreamExt, stream};
use log::*;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::{cancel, result::Result};

/// One page of results and whether the platform reported another one.
#[derive(Debug)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

/// Stream the pages produced by `fetch`, starting at page 1, until the
/// platform reports no further pages. Nothing is requested until the
/// stream is polled, and each new stream starts over from the first page.
/// Cancellation is checked before every request.
pub fn paginate<'a, T, F, Fut>(
    cancel: &'a CancellationToken,
    fetch: F,
) -> impl Stream<Item = Result<Vec<T>>> + 'a
where
    T: 'a,
    F: FnMut(u32) -> Fut + 'a,
    Fut: Future<Output = Result<PageResult<T>>> + 'a,
{
    stream::try_unfold((fetch, Some(1u32)), move |(mut fetch, next)| async move {
        let Some(page) = next else {
            return Ok(None);
        };

        cancel::check(cancel)?;

        debug!("fetching page {page}");
        let result = cancel::cancellable(cancel, fetch(page)).await?;

        let next = (result.has_more && !result.items.is_empty())
            .then_some(page + 1);

        Ok(Some((result.items, (fetch, next))))
    })
}

/// Drain every page into a single list, in request order.
pub async fn collect_all<T, S>(pages: S) -> Result<Vec<T>>
where
    S: Stream<Item = Result<Vec<T>>>,
{
    pages.try_concat().await
}
