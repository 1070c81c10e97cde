//! Search port backed by a triple store

use super::store::TripleStore;
use super::templates::SparqlCompiler;
use crate::models::{Actor, ObjectKind};
use crate::query::{pretty_print, SearchQuery, SortCriterion};
use crate::search::error::SearchResult;
use crate::search::port::{SearchPort, Window};
use crate::search::result::ResultEnvelope;
use async_trait::async_trait;
use std::sync::Arc;

/// Triple-store search over a fixed set of kinds.
///
/// Windows map to LIMIT/OFFSET; an unbounded window fetches every match in one query.
/// Facets are not computed: the facet operations return the plain envelope.
pub struct TripleSearch {
    store: Arc<dyn TripleStore>,
    compiler: SparqlCompiler,
}

impl TripleSearch {
    pub fn new(
        store: Arc<dyn TripleStore>,
        kinds: Vec<ObjectKind>,
        resource_base: impl Into<String>,
    ) -> Self {
        Self {
            store,
            compiler: SparqlCompiler::new(kinds, resource_base),
        }
    }

    pub fn compiler(&self) -> &SparqlCompiler {
        &self.compiler
    }

    async fn execute(
        &self,
        query: &SearchQuery,
        sorts: &[SortCriterion],
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
    ) -> SearchResult<ResultEnvelope> {
        let default_sort = [SortCriterion::default()];
        let effective = if sorts.is_empty() { &default_sort[..] } else { sorts };

        let where_clause = self.compiler.where_clause(query, actor, scope_id)?;
        let select = self.compiler.select(&where_clause, effective, window)?;
        let count = self.compiler.count(&where_clause);

        let (ids, total) = futures::try_join!(
            self.store.select_subjects(&select),
            self.store.count(&count)
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Triple store search failed");
            e
        })?;

        Ok(ResultEnvelope::new(ids, total)
            .with_sort(sorts.to_vec())
            .with_query(pretty_print(query)))
    }
}

#[async_trait]
impl SearchPort for TripleSearch {
    async fn search_with_multi_level_sorting(
        &self,
        query: &SearchQuery,
        sorts: &[SortCriterion],
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
    ) -> SearchResult<ResultEnvelope> {
        self.execute(query, sorts, actor, scope_id, window).await
    }

    async fn search_with_facets_and_multi_level_sorting(
        &self,
        query: &SearchQuery,
        sorts: &[SortCriterion],
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        window: Window,
    ) -> SearchResult<ResultEnvelope> {
        tracing::debug!("Facets are not computed by the triple store backend");
        self.execute(query, sorts, actor, scope_id, window).await
    }

    /// The raw query must bind `?s`. Its ids are sorted in memory.
    async fn search_string(
        &self,
        raw_query: &str,
        sort: &SortCriterion,
        _actor: Option<&Actor>,
        window: Window,
    ) -> SearchResult<ResultEnvelope> {
        let ids = self.store.select_subjects(raw_query).await?;
        let sorted = ResultEnvelope::from_unsorted(ids, std::slice::from_ref(sort));
        let total = sorted.total;
        Ok(ResultEnvelope::new(window.slice(&sorted.ids), total)
            .with_sort(vec![*sort])
            .with_query(raw_query))
    }
}
