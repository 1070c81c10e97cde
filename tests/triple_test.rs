//! Tests for the triple-store backend

use async_trait::async_trait;
use catalog_search::models::{Actor, ObjectKind};
use catalog_search::query::{parse_query, SearchField, SearchQuery, SortCriterion};
use catalog_search::search::config::SparqlConfig;
use catalog_search::search::triple::{SparqlHttpStore, TripleSearch, TripleStore};
use catalog_search::search::{SearchError, SearchPort, SearchResult, Window};
use mockito::Matcher;
use std::sync::{Arc, Mutex};

/// Store answering every select with fixed ids and recording the queries
struct RecordingStore {
    ids: Vec<String>,
    total: u64,
    selects: Mutex<Vec<String>>,
    counts: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn new(ids: &[&str], total: u64) -> Arc<Self> {
        Arc::new(Self {
            ids: ids.iter().map(|id| id.to_string()).collect(),
            total,
            selects: Mutex::new(Vec::new()),
            counts: Mutex::new(Vec::new()),
        })
    }

    fn last_select(&self) -> String {
        self.selects.lock().unwrap().last().cloned().unwrap()
    }

    fn last_count(&self) -> String {
        self.counts.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl TripleStore for RecordingStore {
    async fn select_subjects(&self, sparql: &str) -> SearchResult<Vec<String>> {
        self.selects.lock().unwrap().push(sparql.to_string());
        Ok(self.ids.clone())
    }

    async fn count(&self, sparql: &str) -> SearchResult<u64> {
        self.counts.lock().unwrap().push(sparql.to_string());
        Ok(self.total)
    }
}

fn users(store: Arc<RecordingStore>) -> TripleSearch {
    TripleSearch::new(store, vec![ObjectKind::User], "http://imeji.org/")
}

#[tokio::test]
async fn test_select_and_count_share_where_clause() {
    let store = RecordingStore::new(&["http://imeji.org/user/1"], 7);
    let port = users(store.clone());
    let actor = Actor::new("u1");

    let result = port
        .search(
            &parse_query("name=ada AND NOT email=ada@example.org").unwrap(),
            &SortCriterion::ascending(SearchField::Name),
            Some(&actor),
            None,
            Window::page(40, 20),
        )
        .await
        .unwrap();

    assert_eq!(result.ids, vec!["http://imeji.org/user/1".to_string()]);
    assert_eq!(result.total, 7);

    let count = store.last_count();
    let select = store.last_select();
    let where_clause = count
        .strip_prefix("SELECT (COUNT(DISTINCT ?s) AS ?count) WHERE ")
        .unwrap();
    let body = where_clause.strip_suffix(" }").unwrap();
    assert!(select.starts_with(&format!("SELECT DISTINCT ?s WHERE {}", body)));
    assert!(body.contains("?s a <http://imeji.org/terms/user> ."));
    assert!(body.contains("FILTER NOT EXISTS"));
    assert!(select.contains("OPTIONAL { ?s <http://xmlns.com/foaf/0.1/name> ?sort0 }"));
    assert!(select.ends_with("ORDER BY ASC(?sort0) ASC(?s) LIMIT 20 OFFSET 40"));
}

#[tokio::test]
async fn test_unbounded_window_has_no_limit() {
    let store = RecordingStore::new(&[], 0);
    let port = users(store.clone());

    port.search(
        &SearchQuery::default(),
        &SortCriterion::default(),
        Some(&Actor::admin("root")),
        None,
        Window::new(0, Window::ALL_RESULTS),
    )
    .await
    .unwrap();

    let select = store.last_select();
    assert!(!select.contains("LIMIT"));
    assert!(!select.contains("OFFSET"));
}

#[tokio::test]
async fn test_facets_degrade_to_totals() {
    let store = RecordingStore::new(&["http://imeji.org/user/1", "http://imeji.org/user/2"], 12);
    let port = users(store);

    let result = port
        .search_with_facets(
            &SearchQuery::default(),
            &SortCriterion::default(),
            Some(&Actor::new("u1")),
            None,
            Window::page(0, 2),
        )
        .await
        .unwrap();

    assert!(result.facets.is_none());
    assert_eq!(result.counts.overall, 12);
    assert_eq!(result.counts.container_restricted, 12);
}

#[tokio::test]
async fn test_raw_query_sorted_in_memory() {
    let store = RecordingStore::new(&["c", "a", "d", "b"], 4);
    let port = users(store.clone());

    let raw = "SELECT ?s WHERE { ?s a <http://imeji.org/terms/user> }";
    let result = port
        .search_string(
            raw,
            &SortCriterion::descending(SearchField::Id),
            None,
            Window::page(1, 2),
        )
        .await
        .unwrap();

    assert_eq!(result.ids, vec!["c".to_string(), "b".to_string()]);
    assert_eq!(result.total, 4);
    assert_eq!(store.last_select(), raw);
}

#[tokio::test]
async fn test_unsupported_field() {
    let port = users(RecordingStore::new(&[], 0));
    let err = port
        .search(
            &parse_query("fulltext=glacier").unwrap(),
            &SortCriterion::default(),
            Some(&Actor::new("u1")),
            None,
            Window::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::UnsupportedField { .. }));
}

fn http_store(server: &mockito::Server) -> Arc<SparqlHttpStore> {
    let mut config = SparqlConfig::new(format!("{}/sparql", server.url()));
    config.username = Some("user".to_string());
    config.password = Some("secret".to_string());
    Arc::new(SparqlHttpStore::new(config).unwrap())
}

#[tokio::test]
async fn test_http_store_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let select = server
        .mock("POST", "/sparql")
        .match_header("accept", "application/sparql-results+json")
        .match_header("authorization", "Basic dXNlcjpzZWNyZXQ=")
        .match_body(Matcher::Regex(r"^query=SELECT\+DISTINCT".to_string()))
        .with_status(200)
        .with_header("content-type", "application/sparql-results+json")
        .with_body(
            r#"{"head":{"vars":["s"]},"results":{"bindings":[
                {"s":{"type":"uri","value":"http://imeji.org/user/2"}},
                {"s":{"type":"uri","value":"http://imeji.org/user/9"}}
            ]}}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let count = server
        .mock("POST", "/sparql")
        .match_body(Matcher::Regex("COUNT".to_string()))
        .with_status(200)
        .with_header("content-type", "application/sparql-results+json")
        .with_body(
            r#"{"head":{"vars":["count"]},"results":{"bindings":[
                {"count":{"type":"literal","datatype":"http://www.w3.org/2001/XMLSchema#integer","value":"31"}}
            ]}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let port = TripleSearch::new(http_store(&server), vec![ObjectKind::User], "http://imeji.org/");
    let result = port
        .search(
            &parse_query("name=ada").unwrap(),
            &SortCriterion::default(),
            Some(&Actor::new("u1")),
            None,
            Window::page(0, 2),
        )
        .await
        .unwrap();

    assert_eq!(
        result.ids,
        vec![
            "http://imeji.org/user/2".to_string(),
            "http://imeji.org/user/9".to_string()
        ]
    );
    assert_eq!(result.total, 31);
    select.assert_async().await;
    count.assert_async().await;
}

#[tokio::test]
async fn test_http_store_failure_propagates() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/sparql")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let port = TripleSearch::new(http_store(&server), vec![ObjectKind::User], "http://imeji.org/");
    let err = port
        .search(
            &SearchQuery::default(),
            &SortCriterion::default(),
            Some(&Actor::new("u1")),
            None,
            Window::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::SearchFailed(_)));
}
