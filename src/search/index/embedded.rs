//! Embedded tantivy engine

use super::document::{
    build_catalog_schema, SearchDocument, FULLTEXT_FIELD, NUMERIC_FIELDS, TEXT_FIELDS,
};
use super::dsl::{
    Aggregation, BoolQuery, EngineRequest, EngineResponse, IndexQuery, RawAggregation, SortKey,
    ID_FIELD, INFO_PATH, METADATA_PATH, PRESENT_FIELD,
};
use super::engine::IndexEngine;
use crate::models::CatalogRecord;
use crate::query::{SearchField, SortOrder};
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tantivy::collector::{Count, DocSetCollector};
use tantivy::query::{
    AllQuery, BooleanQuery, EmptyQuery, Occur, Query, QueryParser, RangeQuery, TermQuery,
    TermSetQuery,
};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;
use validator::Validate;

/// Backend name reported for queries the embedded engine cannot run
const EMBEDDED_BACKEND: &str = "embedded index";

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Index size in bytes
    pub index_size_bytes: u64,

    /// Number of segments
    pub num_segments: usize,

    /// Last commit timestamp
    pub last_commit: Option<DateTime<Utc>>,

    /// Scroll cursors currently open
    pub open_cursors: usize,
}

/// Remaining ids of an emulated scroll
struct OpenCursor {
    remaining: Vec<String>,
    batch_size: usize,
    total: u64,
    expires_at: Instant,
}

/// Sort value of one document for one key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Int(i64),
    Text(String),
}

/// A matching document with its extracted sort values
struct Row {
    id: String,
    keys: Vec<Option<SortValue>>,
    doc: TantivyDocument,
}

/// On-disk index owned by this process.
///
/// Matching runs in tantivy; sorting and aggregations run in memory over the matching
/// set. Scroll cursors are snapshots of the sorted ids kept in a table with a TTL.
pub struct EmbeddedIndex {
    /// The Tantivy index
    index: Index,

    /// The schema
    schema: Schema,

    /// Index writer (wrapped in RwLock for thread-safety)
    writer: Arc<RwLock<IndexWriter>>,

    /// Index reader, reloaded after every commit
    reader: IndexReader,

    /// Configuration
    config: SearchConfig,

    cursors: DashMap<String, OpenCursor>,

    last_commit: RwLock<Option<DateTime<Utc>>>,
}

impl EmbeddedIndex {
    /// Open the index at `config.index_path`, creating it if needed
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        config.validate()?;

        // Create index directory if it doesn't exist
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        let schema = build_catalog_schema();

        let index = if Self::index_exists(&config.index_path) {
            Index::open_in_dir(&config.index_path).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })?
        } else {
            Index::create_in_dir(&config.index_path, schema.clone()).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
            })?
        };

        let writer = index
            .writer(config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        tracing::info!(path = %config.index_path.display(), "Opened embedded search index");

        Ok(Self {
            schema: index.schema(),
            index,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            config,
            cursors: DashMap::new(),
            last_commit: RwLock::new(None),
        })
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of scroll cursors currently held
    pub fn open_cursors(&self) -> usize {
        self.cursors.len()
    }

    /// Index a single record, replacing any document with the same id
    pub async fn index_record(&self, record: &CatalogRecord) -> SearchResult<()> {
        record
            .validate()
            .map_err(|e| SearchError::IndexingFailed(format!("Invalid record {}: {}", record.id, e)))?;
        let tantivy_doc = record.to_tantivy_doc(&self.schema);

        let mut writer = self.writer.write().await;
        writer.delete_term(self.id_term(&record.document_id())?);
        writer
            .add_document(tantivy_doc)
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to add document: {}", e)))?;

        if self.config.realtime_indexing {
            self.commit_locked(&mut writer)
                .await
                .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit document: {}", e)))?;
        }
        Ok(())
    }

    /// Index a batch of records with one commit
    pub async fn index_records(&self, records: &[CatalogRecord]) -> SearchResult<usize> {
        for record in records {
            record.validate().map_err(|e| {
                SearchError::IndexingFailed(format!("Invalid record {}: {}", record.id, e))
            })?;
        }

        let mut writer = self.writer.write().await;
        let mut indexed = 0;
        for record in records {
            writer.delete_term(self.id_term(&record.document_id())?);
            writer.add_document(record.to_tantivy_doc(&self.schema)).map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to add document {}: {}", record.id, e))
            })?;
            indexed += 1;
        }

        self.commit_locked(&mut writer)
            .await
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit batch: {}", e)))?;

        tracing::debug!(indexed, "Indexed record batch");
        Ok(indexed)
    }

    /// Delete a record by id
    pub async fn delete_record(&self, record_id: &str) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer.delete_term(self.id_term(record_id)?);

        if self.config.realtime_indexing {
            self.commit_locked(&mut writer)
                .await
                .map_err(|e| SearchError::DeletionFailed(format!("Failed to commit deletion: {}", e)))?;
        }
        Ok(())
    }

    /// Commit pending changes and make them visible to searches
    pub async fn commit(&self) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        self.commit_locked(&mut writer)
            .await
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit: {}", e)))
    }

    /// Remove every document
    pub async fn clear(&self) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer
            .delete_all_documents()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to clear index: {}", e)))?;
        self.commit_locked(&mut writer)
            .await
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit clear: {}", e)))
    }

    /// Get index statistics
    pub async fn stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();

        let total_documents = searcher
            .search(&AllQuery, &Count)
            .map_err(|e| SearchError::SearchFailed(format!("Failed to count documents: {}", e)))?
            as u64;

        let num_segments = searcher.segment_readers().len();

        // Approximate index size
        let index_size_bytes = std::fs::read_dir(&self.config.index_path)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0);

        Ok(IndexStats {
            total_documents,
            index_size_bytes,
            num_segments,
            last_commit: *self.last_commit.read().await,
            open_cursors: self.cursors.len(),
        })
    }

    async fn commit_locked(&self, writer: &mut IndexWriter) -> tantivy::Result<()> {
        writer.commit()?;
        self.reader.reload()?;
        *self.last_commit.write().await = Some(Utc::now());
        Ok(())
    }

    fn id_term(&self, id: &str) -> SearchResult<Term> {
        Ok(Term::from_field_text(self.field(ID_FIELD)?, id))
    }

    fn field(&self, name: &str) -> SearchResult<Field> {
        self.schema
            .get_field(name)
            .map_err(|_| SearchError::SearchFailed(format!("Unknown index field '{}'", name)))
    }

    /// Translate an index query into a tantivy query
    fn translate(&self, query: &IndexQuery) -> SearchResult<Box<dyn Query>> {
        Ok(match query {
            IndexQuery::MatchAll => Box::new(AllQuery),
            IndexQuery::MatchNone => Box::new(EmptyQuery),
            IndexQuery::Term { field, value } => Box::new(TermQuery::new(
                Term::from_field_text(self.field(field)?, value),
                IndexRecordOption::Basic,
            )),
            IndexQuery::Terms { field, values } => {
                if values.is_empty() {
                    Box::new(EmptyQuery)
                } else {
                    let field = self.field(field)?;
                    Box::new(TermSetQuery::new(
                        values.iter().map(|v| Term::from_field_text(field, v)),
                    ))
                }
            }
            IndexQuery::Match { fields, text } => self.translate_match(fields, text)?,
            IndexQuery::Range {
                field,
                lower,
                upper,
            } => Box::new(RangeQuery::new_i64_bounds(field.clone(), *lower, *upper)),
            IndexQuery::Exists { field } => Box::new(TermQuery::new(
                Term::from_field_text(self.field(PRESENT_FIELD)?, field),
                IndexRecordOption::Basic,
            )),
            IndexQuery::Bool(query) => self.translate_bool(query)?,
            IndexQuery::QueryString { query } => {
                let default_fields = TEXT_FIELDS
                    .iter()
                    .chain(std::iter::once(&FULLTEXT_FIELD))
                    .map(|name| self.field(name))
                    .collect::<SearchResult<Vec<Field>>>()?;
                QueryParser::for_index(&self.index, default_fields).parse_query(query)?
            }
            IndexQuery::Nested { path, .. } => {
                return Err(SearchError::UnsupportedField {
                    field: nested_field(path),
                    backend: EMBEDDED_BACKEND,
                })
            }
        })
    }

    /// Every token of `text` must occur in one of the fields
    fn translate_match(&self, fields: &[String], text: &str) -> SearchResult<Box<dyn Query>> {
        let fields = fields
            .iter()
            .map(|name| self.field(name))
            .collect::<SearchResult<Vec<Field>>>()?;
        let Some(first) = fields.first() else {
            return Ok(Box::new(EmptyQuery));
        };

        let mut analyzer = self.index.tokenizer_for_field(*first)?;
        let mut tokens: Vec<String> = Vec::new();
        let mut stream = analyzer.token_stream(text);
        stream.process(&mut |token| {
            if !tokens.contains(&token.text) {
                tokens.push(token.text.clone());
            }
        });

        if tokens.is_empty() {
            return Ok(Box::new(EmptyQuery));
        }

        let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
            .iter()
            .map(|token| {
                let alternatives: Vec<(Occur, Box<dyn Query>)> = fields
                    .iter()
                    .map(|field| {
                        let query: Box<dyn Query> = Box::new(TermQuery::new(
                            Term::from_field_text(*field, token),
                            IndexRecordOption::Basic,
                        ));
                        (Occur::Should, query)
                    })
                    .collect();
                let query: Box<dyn Query> = Box::new(BooleanQuery::new(alternatives));
                (Occur::Must, query)
            })
            .collect();
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    fn translate_bool(&self, query: &BoolQuery) -> SearchResult<Box<dyn Query>> {
        if query.is_empty() {
            return Ok(Box::new(AllQuery));
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for clause in query.must.iter().chain(&query.filter) {
            clauses.push((Occur::Must, self.translate(clause)?));
        }
        if !query.should.is_empty() {
            let mut alternatives: Vec<(Occur, Box<dyn Query>)> = Vec::new();
            for clause in &query.should {
                alternatives.push((Occur::Should, self.translate(clause)?));
            }
            clauses.push((Occur::Must, Box::new(BooleanQuery::new(alternatives))));
        }
        for clause in &query.must_not {
            clauses.push((Occur::MustNot, self.translate(clause)?));
        }

        // A boolean query of exclusions alone matches nothing in tantivy
        if query.must.is_empty() && query.filter.is_empty() && query.should.is_empty() {
            clauses.push((Occur::Must, Box::new(AllQuery)));
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Matching ids in sort order and the aggregations
    fn run(&self, request: &EngineRequest) -> SearchResult<(Vec<String>, Vec<(String, RawAggregation)>)> {
        let searcher = self.reader.searcher();
        let combined = request.combined_query();
        let query = self.translate(&combined)?;
        let addresses = searcher.search(&*query, &DocSetCollector)?;

        let mut rows = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            let Some(id) = first_text(&doc, self.field(ID_FIELD)?) else {
                continue;
            };
            let keys = request
                .sort
                .iter()
                .map(|key| self.sort_value(&doc, key))
                .collect::<SearchResult<Vec<_>>>()?;
            rows.push(Row { id, keys, doc });
        }
        rows.sort_by(|a, b| compare_rows(a, b, &request.sort));

        let mut aggregations = Vec::with_capacity(request.aggregations.len());
        for spec in &request.aggregations {
            let raw = match &spec.aggregation {
                Aggregation::Terms { field, size } => {
                    RawAggregation::Buckets(terms_buckets(&rows, self.field(field)?, *size))
                }
                Aggregation::Stats { field } => stats(&rows, self.field(field)?),
                Aggregation::Filter(filter) => {
                    let counted =
                        self.translate(&IndexQuery::must(vec![combined.clone(), filter.clone()]))?;
                    RawAggregation::Count(searcher.search(&*counted, &Count)? as u64)
                }
            };
            aggregations.push((spec.name.clone(), raw));
        }

        Ok((rows.into_iter().map(|row| row.id).collect(), aggregations))
    }

    fn sort_value(&self, doc: &TantivyDocument, key: &SortKey) -> SearchResult<Option<SortValue>> {
        let name = key.source_field();
        let field = match self.schema.get_field(name) {
            Ok(field) => field,
            // unmapped fields sort as missing
            Err(_) => return Ok(None),
        };
        let value = doc.get_first(field);
        Ok(if NUMERIC_FIELDS.contains(&name) {
            value.and_then(|v| v.as_i64()).map(SortValue::Int)
        } else {
            value
                .and_then(|v| v.as_str())
                .map(|s| SortValue::Text(s.to_lowercase()))
        })
    }

    fn reserve_cursor(&self) -> SearchResult<()> {
        let now = Instant::now();
        self.cursors.retain(|_, cursor| cursor.expires_at > now);
        if self.cursors.len() >= self.config.max_open_cursors {
            tracing::warn!(
                open = self.cursors.len(),
                limit = self.config.max_open_cursors,
                "Scroll cursor capacity exhausted"
            );
            return Err(SearchError::CursorCapacityExceeded(self.config.max_open_cursors));
        }
        Ok(())
    }
}

/// Search field behind a nested path. Records are indexed without nested metadata.
fn nested_field(path: &str) -> SearchField {
    match path {
        METADATA_PATH => SearchField::Metadata,
        INFO_PATH => SearchField::CollectionMetadata,
        _ => SearchField::Technical,
    }
}

fn first_text(doc: &TantivyDocument, field: Field) -> Option<String> {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Missing values sort last in either direction
fn compare_rows(a: &Row, b: &Row, sort: &[SortKey]) -> Ordering {
    for (index, key) in sort.iter().enumerate() {
        let ordering = match (&a.keys[index], &b.keys[index]) {
            (Some(x), Some(y)) => match key.order {
                SortOrder::Ascending => x.cmp(y),
                SortOrder::Descending => y.cmp(x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.id.cmp(&b.id)
}

/// Document counts per value, most frequent first
fn terms_buckets(rows: &[Row], field: Field, size: usize) -> Vec<(String, u64)> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for row in rows {
        let mut seen: Vec<&str> = Vec::new();
        for value in row.doc.get_all(field).filter_map(|v| v.as_str()) {
            if !seen.contains(&value) {
                seen.push(value);
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }
        }
    }
    let mut buckets: Vec<(String, u64)> = counts.into_iter().collect();
    buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    buckets.truncate(size);
    buckets
}

fn stats(rows: &[Row], field: Field) -> RawAggregation {
    let values: Vec<i64> = rows
        .iter()
        .filter_map(|row| row.doc.get_first(field).and_then(|v| v.as_i64()))
        .collect();
    RawAggregation::Stats {
        count: values.len() as u64,
        min: values.iter().min().map(|v| *v as f64),
        max: values.iter().max().map(|v| *v as f64),
    }
}

#[async_trait]
impl IndexEngine for EmbeddedIndex {
    fn name(&self) -> &'static str {
        "embedded"
    }

    async fn search(
        &self,
        request: &EngineRequest,
        scroll: Option<Duration>,
    ) -> SearchResult<EngineResponse> {
        if scroll.is_some() {
            self.reserve_cursor()?;
        }

        let (mut ids, aggregations) = self.run(request)?;
        let total = ids.len() as u64;

        let Some(ttl) = scroll else {
            let start = request.from.min(ids.len());
            let end = request.from.saturating_add(request.size).min(ids.len());
            return Ok(EngineResponse {
                ids: ids.drain(start..end).collect(),
                total,
                cursor: None,
                aggregations,
            });
        };

        let batch_size = request.size.max(1);
        let remaining = ids.split_off(batch_size.min(ids.len()));
        let cursor = uuid::Uuid::new_v4().to_string();
        self.cursors.insert(
            cursor.clone(),
            OpenCursor {
                remaining,
                batch_size,
                total,
                expires_at: Instant::now() + ttl,
            },
        );
        tracing::debug!(cursor = %cursor, total, "Opened embedded scroll cursor");

        Ok(EngineResponse {
            ids,
            total,
            cursor: Some(cursor),
            aggregations,
        })
    }

    async fn scroll(&self, cursor: &str, ttl: Duration) -> SearchResult<EngineResponse> {
        let now = Instant::now();
        let mut entry = self
            .cursors
            .get_mut(cursor)
            .ok_or_else(|| SearchError::CursorExpired(cursor.to_string()))?;
        if entry.expires_at <= now {
            drop(entry);
            self.cursors.remove(cursor);
            return Err(SearchError::CursorExpired(cursor.to_string()));
        }

        let take = entry.batch_size.min(entry.remaining.len());
        let ids: Vec<String> = entry.remaining.drain(..take).collect();
        entry.expires_at = now + ttl;

        Ok(EngineResponse {
            ids,
            total: entry.total,
            cursor: Some(cursor.to_string()),
            aggregations: Vec::new(),
        })
    }

    async fn clear_scroll(&self, cursor: &str) -> SearchResult<()> {
        if self.cursors.remove(cursor).is_none() {
            tracing::debug!(cursor = %cursor, "Scroll cursor already gone");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectKind;
    use crate::search::config::SearchConfigBuilder;
    use tempfile::TempDir;

    async fn open(temp_dir: &TempDir) -> EmbeddedIndex {
        let config = SearchConfigBuilder::new()
            .index_path(temp_dir.path().to_path_buf())
            .max_open_cursors(2)
            .build();
        EmbeddedIndex::new(config).await.unwrap()
    }

    fn record(id: &str, title: &str) -> CatalogRecord {
        let mut record = CatalogRecord::new(id, ObjectKind::Item);
        record.title = title.to_string();
        record.status = Some("RELEASED".to_string());
        record
    }

    fn request(post: IndexQuery, size: usize) -> EngineRequest {
        EngineRequest {
            indices: vec!["data".to_string()],
            base: IndexQuery::MatchAll,
            post,
            sort: vec![SortKey::new("title.sort", SortOrder::Ascending, "keyword")],
            aggregations: Vec::new(),
            from: 0,
            size,
        }
    }

    #[tokio::test]
    async fn test_index_creation() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir).await;
        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_documents, 0);
        assert!(stats.last_commit.is_none());
    }

    #[tokio::test]
    async fn test_reindex_replaces_document() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir).await;
        index.index_record(&record("i1", "First")).await.unwrap();
        index.index_record(&record("i1", "Second")).await.unwrap();

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.total_documents, 1);
        assert!(stats.last_commit.is_some());

        let response = index
            .search(&request(IndexQuery::matching(&["title"], "second"), 10), None)
            .await
            .unwrap();
        assert_eq!(response.ids, vec!["i1".to_string()]);

        index.delete_record("i1").await.unwrap();
        assert_eq!(index.stats().await.unwrap().total_documents, 0);
    }

    #[tokio::test]
    async fn test_sorted_page() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir).await;
        index
            .index_records(&[record("a", "Cedar"), record("b", "alder"), record("c", "Birch")])
            .await
            .unwrap();

        let mut req = request(IndexQuery::MatchAll, 2);
        req.from = 1;
        let response = index.search(&req, None).await.unwrap();
        assert_eq!(response.total, 3);
        assert_eq!(response.ids, vec!["c".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_nested_metadata_is_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir).await;
        let nested = IndexQuery::nested(
            METADATA_PATH,
            IndexQuery::must(vec![
                IndexQuery::term("metadata.index", "title"),
                IndexQuery::matching(&["metadata.text"], "TEST"),
            ]),
        );
        let result = index.search(&request(nested, 10), None).await;
        assert!(matches!(
            result,
            Err(SearchError::UnsupportedField {
                field: SearchField::Metadata,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_scroll_and_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir).await;
        let records: Vec<CatalogRecord> = (0..5)
            .map(|i| record(&format!("r{}", i), &format!("title {}", i)))
            .collect();
        index.index_records(&records).await.unwrap();

        let ttl = Duration::from_secs(60);
        let first = index.search(&request(IndexQuery::MatchAll, 2), Some(ttl)).await.unwrap();
        let cursor = first.cursor.clone().unwrap();
        assert_eq!(first.ids.len(), 2);
        assert_eq!(index.scroll(&cursor, ttl).await.unwrap().ids.len(), 2);
        assert_eq!(index.scroll(&cursor, ttl).await.unwrap().ids.len(), 1);
        assert!(index.scroll(&cursor, ttl).await.unwrap().ids.is_empty());

        let second = index.search(&request(IndexQuery::MatchAll, 2), Some(ttl)).await.unwrap();
        assert!(matches!(
            index.search(&request(IndexQuery::MatchAll, 2), Some(ttl)).await,
            Err(SearchError::CursorCapacityExceeded(2))
        ));

        index.clear_scroll(&cursor).await.unwrap();
        index.clear_scroll(&second.cursor.unwrap()).await.unwrap();
        assert_eq!(index.open_cursors(), 0);
        assert!(matches!(
            index.scroll(&cursor, ttl).await,
            Err(SearchError::CursorExpired(_))
        ));
    }

    #[tokio::test]
    async fn test_exists_and_negation() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir).await;
        let mut nested = record("n1", "Nested");
        nested.parent = Some("c1".to_string());
        index
            .index_records(&[nested, record("r1", "Root")])
            .await
            .unwrap();

        let response = index
            .search(&request(IndexQuery::not(IndexQuery::exists("parent")), 10), None)
            .await
            .unwrap();
        assert_eq!(response.ids, vec!["r1".to_string()]);
    }
}
