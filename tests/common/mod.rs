//! Common test utilities for search testing
//!
//! Record fixtures, embedded index setup and an engine wrapper that records the
//! traffic an adapter sends to its engine.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_search::models::{CatalogRecord, ObjectKind};
use catalog_search::search::index::{EmbeddedIndex, EngineRequest, EngineResponse, IndexEngine};
use catalog_search::search::{SearchConfig, SearchConfigBuilder, SearchError, SearchResult};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Midnight UTC of a `YYYY-MM-DD` day
pub fn day(text: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Helper to create a test item
pub fn item(id: &str, title: &str, status: &str, created: &str) -> CatalogRecord {
    let mut record = CatalogRecord::new(id, ObjectKind::Item);
    record.title = title.to_string();
    record.status = Some(status.to_string());
    record.created = Some(day(created));
    record
}

/// Five items in two container trees:
///
/// ```text
/// c1 ── i1 (released), p1 (pending)
///  └── c2 ── i2 (released)
/// c3 ── i3 (released), p2 (pending)
/// ```
pub fn catalog() -> Vec<CatalogRecord> {
    let mut i1 = item("i1", "Glacier lake survey", "RELEASED", "2020-03-01");
    i1.parent = Some("c1".to_string());
    i1.filetype = Some("image".to_string());
    i1.license = Some("CC0".to_string());
    i1.filesize = Some(100);

    let mut i2 = item("i2", "Mountain lake", "RELEASED", "2021-06-15");
    i2.parent = Some("c2".to_string());
    i2.ancestors = vec!["c1".to_string()];
    i2.filetype = Some("video".to_string());
    i2.filesize = Some(2_000);

    let mut i3 = item("i3", "Desert dunes", "RELEASED", "2022-01-10");
    i3.parent = Some("c3".to_string());
    i3.filetype = Some("image".to_string());
    i3.license = Some("CC-BY".to_string());
    i3.filesize = Some(50);

    let mut p1 = item("p1", "Lake draft", "PENDING", "2021-01-01");
    p1.parent = Some("c1".to_string());
    p1.filetype = Some("image".to_string());

    let mut p2 = item("p2", "Private notes", "PENDING", "2023-01-01");
    p2.parent = Some("c3".to_string());
    p2.filetype = Some("text".to_string());

    vec![i1, i2, i3, p1, p2]
}

/// Configuration for an embedded index under `dir`
pub fn test_config(dir: &TempDir) -> SearchConfig {
    SearchConfigBuilder::new()
        .index_path(dir.path().to_path_buf())
        .build()
}

/// Helper to create an embedded index holding `records`
pub async fn indexed(config: SearchConfig, records: &[CatalogRecord]) -> Arc<EmbeddedIndex> {
    let index = EmbeddedIndex::new(config).await.unwrap();
    index.index_records(records).await.unwrap();
    Arc::new(index)
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Engine wrapper counting batches and cursor closes
pub struct CountingEngine {
    inner: Arc<dyn IndexEngine>,
    /// Ids per response, first search included
    batches: Mutex<Vec<usize>>,
    closes: AtomicUsize,
    scrolls: AtomicUsize,
    /// Scroll call (1-based) that fails instead of reaching the engine
    fail_on_scroll: Option<usize>,
}

impl CountingEngine {
    pub fn new(inner: Arc<dyn IndexEngine>) -> Self {
        Self {
            inner,
            batches: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            scrolls: AtomicUsize::new(0),
            fail_on_scroll: None,
        }
    }

    pub fn failing_on_scroll(inner: Arc<dyn IndexEngine>, call: usize) -> Self {
        Self {
            fail_on_scroll: Some(call),
            ..Self::new(inner)
        }
    }

    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexEngine for CountingEngine {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn search(
        &self,
        request: &EngineRequest,
        scroll: Option<Duration>,
    ) -> SearchResult<EngineResponse> {
        let response = self.inner.search(request, scroll).await?;
        self.batches.lock().unwrap().push(response.ids.len());
        Ok(response)
    }

    async fn scroll(&self, cursor: &str, ttl: Duration) -> SearchResult<EngineResponse> {
        let call = self.scrolls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_scroll == Some(call) {
            return Err(SearchError::BackendUnavailable("connection reset".to_string()));
        }
        let response = self.inner.scroll(cursor, ttl).await?;
        self.batches.lock().unwrap().push(response.ids.len());
        Ok(response)
    }

    async fn clear_scroll(&self, cursor: &str) -> SearchResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.clear_scroll(cursor).await
    }
}
