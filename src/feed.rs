use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::error::StoreError;
use crate::identity::OwnerId;
use crate::model::GenerationWithResults;
use crate::store::Store;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("page_size must be at least 1")]
    ZeroPageSize,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FeedError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ZeroPageSize => false,
            Self::Store(e) => e.is_retryable(),
        }
    }
}

/// One page of the visible feed.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub items: Vec<GenerationWithResults>,
    pub total_count: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

impl Page {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            current_page: 1,
            total_pages: 1,
        }
    }
}

/// `ceil(total / page_size)`, never less than one page.
pub fn total_pages(total_count: u64, page_size: u64) -> u64 {
    total_count.div_ceil(page_size.max(1)).max(1)
}

/// Read side over stored generations. Pagination is best-effort over a
/// moving data set: the count and the page are separate reads.
#[derive(Clone)]
pub struct Feed {
    store: Arc<Store>,
}

impl Feed {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Generations owned by the caller or public, newest first. Anonymous
    /// callers get an empty first page. Pages below 1 are read as page 1.
    pub async fn list_visible(
        &self,
        owner: Option<&OwnerId>,
        page: u64,
        page_size: u64,
    ) -> Result<Page, FeedError> {
        if page_size == 0 {
            return Err(FeedError::ZeroPageSize);
        }
        let Some(owner) = owner else {
            return Ok(Page::empty());
        };

        let page = page.max(1);
        let total_count = self.store.count_visible(owner.as_str()).await?;
        let offset = (page - 1).saturating_mul(page_size);
        let items = if offset >= total_count {
            Vec::new()
        } else {
            self.store
                .list_visible(owner.as_str(), page_size, offset)
                .await?
        };

        Ok(Page {
            items,
            total_count,
            current_page: page,
            total_pages: total_pages(total_count, page_size),
        })
    }

    /// The caller's own most recent generations.
    pub async fn list_own_recent(
        &self,
        owner: Option<&OwnerId>,
        limit: u64,
    ) -> Result<Vec<GenerationWithResults>, FeedError> {
        let Some(owner) = owner else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }
        Ok(self.store.list_owned(owner.as_str(), limit).await?)
    }
}
