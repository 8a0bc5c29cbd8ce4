//! api::pagination
//!
//! Driver for the service's page-numbered collections.
//!
//! Pages are 1-indexed and hold at most [`MAX_PAGE_SIZE`] items. When every
//! page is requested, pages are fetched one after another until a page
//! comes back shorter than the page size; the server keeps per-query state,
//! so pages are never requested concurrently.

use std::future::Future;

use super::traits::ApiError;
use crate::core::cancel::CancelToken;
use crate::core::types::ValidationError;

pub const MAX_PAGE_SIZE: u32 = 50;
pub const DEFAULT_PAGE_SIZE: u32 = MAX_PAGE_SIZE;

/// Which page(s) of a collection to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParam {
    pub page: u32,
    pub page_size: u32,
    pub all_pages: bool,
}

impl Default for PaginationParam {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            all_pages: false,
        }
    }
}

impl PaginationParam {
    /// Every page, at the largest page size.
    pub fn all() -> Self {
        Self {
            all_pages: true,
            ..Self::default()
        }
    }

    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            all_pages: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page < 1 {
            return Err(ValidationError::new("page", "must be at least 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ValidationError::new(
                "page-size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        Ok(())
    }
}

/// Run `fetch(page, page_size)` according to `param`.
///
/// With `all_pages`, the results of every page are concatenated in server
/// order. The first failing page aborts the walk. The token is checked
/// before each page.
pub async fn paginate<T, F, Fut>(
    param: PaginationParam,
    cancel: &CancelToken,
    mut fetch: F,
) -> Result<Vec<T>, ApiError>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    param.validate()?;

    if !param.all_pages {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        return fetch(param.page, param.page_size).await;
    }

    let mut all = Vec::new();
    let mut page = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        let items = fetch(page, param.page_size).await?;
        let short = items.len() < param.page_size as usize;
        all.extend(items);
        if short {
            break;
        }
        page += 1;
    }

    tracing::debug!(pages = page, items = all.len(), "fetched all pages");
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn pages_of(items: Vec<u32>, size: usize) -> impl Fn(u32, u32) -> Vec<u32> {
        move |page, _| {
            items
                .chunks(size)
                .nth(page as usize - 1)
                .map(|c| c.to_vec())
                .unwrap_or_default()
        }
    }

    #[tokio::test]
    async fn single_page_uses_given_page() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let got = paginate(PaginationParam::page(3, 10), &CancelToken::new(), |p, s| {
            log.lock().unwrap().push((p, s));
            async move { Ok::<_, ApiError>(vec![p]) }
        })
        .await
        .unwrap();
        assert_eq!(got, vec![3]);
        assert_eq!(*seen.lock().unwrap(), vec![(3, 10)]);
    }

    #[tokio::test]
    async fn all_pages_until_short_page() {
        let source = pages_of(vec![1, 2, 3, 4, 5], 2);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let log = calls.clone();
        let got = paginate(
            PaginationParam::all().with_page_size(2),
            &CancelToken::new(),
            |p, s| {
                log.lock().unwrap().push(p);
                let items = source(p, s);
                async move { Ok::<_, ApiError>(items) }
            },
        )
        .await
        .unwrap();
        assert_eq!(got, vec![1, 2, 3, 4, 5]);
        assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn exact_multiple_needs_empty_page() {
        let source = pages_of(vec![1, 2, 3, 4], 2);
        let got = paginate(
            PaginationParam::all().with_page_size(2),
            &CancelToken::new(),
            |p, s| {
                let items = source(p, s);
                async move { Ok::<_, ApiError>(items) }
            },
        )
        .await
        .unwrap();
        assert_eq!(got, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn failing_page_aborts() {
        let err = paginate(
            PaginationParam::all().with_page_size(1),
            &CancelToken::new(),
            |p, _| async move {
                if p == 2 {
                    Err(ApiError::NoResponse { status: 502 })
                } else {
                    Ok(vec![p])
                }
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NoResponse { status: 502 }));
    }

    #[tokio::test]
    async fn rejects_out_of_range_page_size() {
        let err = paginate(
            PaginationParam::page(1, 51),
            &CancelToken::new(),
            |_, _| async { Ok::<Vec<u32>, ApiError>(vec![]) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn cancelled_before_first_page() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = paginate(PaginationParam::all(), &cancel, |_, _| async {
            Ok::<Vec<u32>, ApiError>(vec![])
        })
        .await
        .unwrap_err();
        assert!(err.is_cancelled());
    }
}
