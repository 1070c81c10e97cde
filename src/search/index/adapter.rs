//! Search port backed by an index engine

use super::aggregations::to_facets;
use super::compiler::IndexQueryCompiler;
use super::dsl::{EngineRequest, RawAggregation};
use super::engine::{CursorGuard, IndexEngine};
use crate::models::{Actor, ObjectKind};
use crate::query::{pretty_print, SearchQuery, SortCriterion};
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use crate::search::port::{PageSize, SearchPort, Window};
use crate::search::result::ResultEnvelope;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Paging limits the adapter applies
#[derive(Debug, Clone, Copy)]
struct Paging {
    page_ceiling: usize,
    deep_pagination_ceiling: usize,
    scroll_batch_size: usize,
    scroll_ttl: Duration,
}

/// Ids, total and aggregations of a windowed retrieval
struct Hits {
    ids: Vec<String>,
    total: u64,
    aggregations: Vec<(String, RawAggregation)>,
}

/// Index-backed search over a fixed set of kinds.
///
/// Small windows are served by one from/size request. Large or deep windows open a
/// scroll cursor, drain it batch by batch and slice the window in memory.
pub struct IndexSearch {
    engine: Arc<dyn IndexEngine>,
    compiler: IndexQueryCompiler,
    paging: Paging,
}

impl IndexSearch {
    pub fn new(engine: Arc<dyn IndexEngine>, kinds: Vec<ObjectKind>, config: &SearchConfig) -> Self {
        Self {
            engine,
            compiler: IndexQueryCompiler::new(kinds, config.facet_bucket_size),
            paging: Paging {
                page_ceiling: config.page_ceiling,
                deep_pagination_ceiling: config.deep_pagination_ceiling,
                scroll_batch_size: config.scroll_batch_size,
                scroll_ttl: config.scroll_ttl(),
            },
        }
    }

    pub fn compiler(&self) -> &IndexQueryCompiler {
        &self.compiler
    }

    async fn execute(
        &self,
        query: &SearchQuery,
        sorts: &[SortCriterion],
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
        with_facets: bool,
    ) -> SearchResult<ResultEnvelope> {
        let request = self
            .compiler
            .request(query, sorts, actor, scope_id, with_facets)
            .map_err(|e| {
                tracing::warn!(error = %e, "Query cannot be compiled for the index backend");
                e
            })?;

        let hits = self.retrieve(request.clone(), window).await?;

        let mut envelope = ResultEnvelope::new(hits.ids, hits.total);
        if with_facets {
            envelope = envelope.with_facets(to_facets(&request.aggregations, &hits.aggregations));
        }
        Ok(envelope
            .with_sort(sorts.to_vec())
            .with_query(pretty_print(query)))
    }

    async fn retrieve(&self, request: EngineRequest, window: Window) -> SearchResult<Hits> {
        let shallow =
            window.is_shallow(self.paging.page_ceiling, self.paging.deep_pagination_ceiling);
        let result = match (shallow, window.size()) {
            (true, PageSize::Limited(size)) => self.fetch_page(request, window.offset(), size).await,
            _ => self.fetch_by_scroll(request, window).await,
        };
        result.map_err(|e| {
            tracing::error!(engine = self.engine.name(), error = %e, "Index search failed");
            e
        })
    }

    async fn fetch_page(
        &self,
        mut request: EngineRequest,
        offset: usize,
        size: usize,
    ) -> SearchResult<Hits> {
        request.from = offset;
        request.size = size;
        let response = self.engine.search(&request, None).await?;
        Ok(Hits {
            ids: response.ids,
            total: response.total,
            aggregations: response.aggregations,
        })
    }

    async fn fetch_by_scroll(&self, mut request: EngineRequest, window: Window) -> SearchResult<Hits> {
        let ttl = self.paging.scroll_ttl;
        request.from = 0;
        request.size = self.paging.scroll_batch_size;

        let first = self.engine.search(&request, Some(ttl)).await?;
        let total = first.total;
        let aggregations = first.aggregations;
        let mut ids = first.ids;

        let Some(cursor) = first.cursor else {
            return Ok(Hits {
                ids: window.slice(&ids),
                total,
                aggregations,
            });
        };
        let mut guard = CursorGuard::new(Arc::clone(&self.engine), cursor);
        tracing::debug!(
            engine = self.engine.name(),
            total,
            offset = window.offset(),
            "Opened scroll cursor"
        );

        let target = window.end();
        let mut batch_len = ids.len();
        while batch_len > 0 && target.map_or(true, |end| ids.len() < end) {
            let Some(cursor) = guard.cursor().map(str::to_string) else {
                break;
            };
            match self.engine.scroll(&cursor, ttl).await {
                Ok(batch) => {
                    if let Some(next) = batch.cursor {
                        guard.advance(next);
                    }
                    batch_len = batch.ids.len();
                    ids.extend(batch.ids);
                }
                Err(e) => {
                    tracing::error!(cursor = %cursor, fetched = ids.len(), error = %e, "Scroll failed");
                    if let Err(close) = guard.release().await {
                        tracing::warn!(error = %close, "Failed to close scroll cursor after error");
                    }
                    return Err(SearchError::ScrollAborted(e.to_string()));
                }
            }
        }

        if let Err(e) = guard.release().await {
            tracing::warn!(error = %e, "Failed to close scroll cursor");
        }

        Ok(Hits {
            ids: window.slice(&ids),
            total,
            aggregations,
        })
    }
}

#[async_trait]
impl SearchPort for IndexSearch {
    async fn search_with_multi_level_sorting(
        &self,
        query: &SearchQuery,
        sorts: &[SortCriterion],
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
    ) -> SearchResult<ResultEnvelope> {
        self.execute(query, sorts, actor, scope_id, window, false)
            .await
    }

    async fn search_with_facets_and_multi_level_sorting(
        &self,
        query: &SearchQuery,
        sorts: &[SortCriterion],
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
    ) -> SearchResult<ResultEnvelope> {
        self.execute(query, sorts, actor, scope_id, window, true)
            .await
    }

    async fn search_string(
        &self,
        raw_query: &str,
        sort: &SortCriterion,
        actor: Option<&Actor>,
        window: Window,
    ) -> SearchResult<ResultEnvelope> {
        let request = self.compiler.raw_request(raw_query, sort, actor)?;
        let hits = self.retrieve(request, window).await?;
        Ok(ResultEnvelope::new(hits.ids, hits.total)
            .with_sort(vec![*sort])
            .with_query(raw_query))
    }
}
