//! Contract shared by every search backend

use super::config::DEFAULT_PAGE_CEILING;
use super::error::SearchResult;
use super::result::ResultEnvelope;
use crate::models::Actor;
use crate::query::{SearchQuery, SortCriterion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Requested number of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    /// Every matching record
    All,
    Limited(usize),
}

/// Pagination window: skip `offset` results, return up to `size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    offset: usize,
    size: PageSize,
}

impl Window {
    /// Size sentinel for "no limit"
    pub const ALL_RESULTS: i64 = -1;

    /// Window from raw integers. A size of [`Self::ALL_RESULTS`] means no limit, any other
    /// negative size falls back to the default page ceiling. Negative offsets clamp to 0.
    pub fn new(offset: i64, size: i64) -> Self {
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let size = if size == Self::ALL_RESULTS {
            PageSize::All
        } else if size < 0 {
            PageSize::Limited(DEFAULT_PAGE_CEILING)
        } else {
            PageSize::Limited(usize::try_from(size).unwrap_or(usize::MAX))
        };
        Self { offset, size }
    }

    pub fn all() -> Self {
        Self {
            offset: 0,
            size: PageSize::All,
        }
    }

    pub fn page(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size: PageSize::Limited(size),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    /// Exclusive end of the window, `None` when unbounded
    pub fn end(&self) -> Option<usize> {
        match self.size {
            PageSize::All => None,
            PageSize::Limited(size) => Some(self.offset.saturating_add(size)),
        }
    }

    /// True if one from/size request is enough
    pub fn is_shallow(&self, page_ceiling: usize, deep_pagination_ceiling: usize) -> bool {
        match self.size {
            PageSize::All => false,
            PageSize::Limited(size) => {
                size < page_ceiling && self.offset.saturating_add(size) < deep_pagination_ceiling
            }
        }
    }

    /// The part of `items` this window covers
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = self.offset.min(items.len());
        let end = self.end().unwrap_or(usize::MAX).min(items.len());
        items[start..end].to_vec()
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::page(0, 20)
    }
}

/// Search operations every backend implements.
///
/// Visibility for `actor` (anonymous when `None`) is compiled into the backend query.
/// `scope_id` narrows the search to the descendants of one container. Backend failures
/// are returned as errors, never as empty envelopes.
#[async_trait]
pub trait SearchPort: Send + Sync {
    async fn search(
        &self,
        query: &SearchQuery,
        sort: &SortCriterion,
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
    ) -> SearchResult<ResultEnvelope> {
        self.search_with_multi_level_sorting(query, std::slice::from_ref(sort), actor, scope_id, window)
            .await
    }

    async fn search_with_facets(
        &self,
        query: &SearchQuery,
        sort: &SortCriterion,
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
    ) -> SearchResult<ResultEnvelope> {
        self.search_with_facets_and_multi_level_sorting(
            query,
            std::slice::from_ref(sort),
            actor,
            scope_id,
            window,
        )
        .await
    }

    /// Later criteria break ties of earlier ones
    async fn search_with_multi_level_sorting(
        &self,
        query: &SearchQuery,
        sorts: &[SortCriterion],
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
    ) -> SearchResult<ResultEnvelope>;

    async fn search_with_facets_and_multi_level_sorting(
        &self,
        query: &SearchQuery,
        sorts: &[SortCriterion],
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
    ) -> SearchResult<ResultEnvelope>;

    /// Run a query written in the backend's native language. Administrative use only.
    async fn search_string(
        &self,
        raw_query: &str,
        sort: &SortCriterion,
        actor: Option<&Actor>,
        window: Window,
    ) -> SearchResult<ResultEnvelope>;
}

/// Loads full records for ids returned by a search
#[async_trait]
pub trait RecordHydrator: Send + Sync {
    type Record: Send;

    /// Records for `ids` in any order; unknown ids may be left out
    async fn load(&self, ids: &[String]) -> SearchResult<Vec<Self::Record>>;

    fn record_id(record: &Self::Record) -> &str;
}

/// Load the records of an envelope in result order
pub async fn hydrate<H: RecordHydrator>(
    envelope: &ResultEnvelope,
    hydrator: &H,
) -> SearchResult<Vec<H::Record>> {
    let loaded = hydrator.load(&envelope.ids).await?;
    let mut by_id: HashMap<String, H::Record> = loaded
        .into_iter()
        .map(|record| (H::record_id(&record).to_string(), record))
        .collect();

    let mut records = Vec::with_capacity(envelope.ids.len());
    for id in &envelope.ids {
        match by_id.remove(id) {
            Some(record) => records.push(record),
            None => tracing::debug!(record_id = %id, "Record vanished between search and load"),
        }
    }
    Ok(records)
}
