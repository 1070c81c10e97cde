//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Default page ceiling, also used for negative page sizes
pub const DEFAULT_PAGE_CEILING: usize = 500;
/// Default offset + size limit for from/size paging
pub const DEFAULT_DEEP_PAGINATION_CEILING: usize = 10_000;
/// Default cursor time-to-live in seconds
pub const DEFAULT_SCROLL_TTL_SECS: u64 = 60;

/// Index engine used for index-backed kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexEngineKind {
    /// On-disk tantivy index owned by this process
    #[default]
    Embedded,
    /// Remote Elasticsearch cluster
    Elasticsearch,
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_ceilings"))]
pub struct SearchConfig {
    /// Engine behind the index backend
    #[serde(default)]
    pub index_engine: IndexEngineKind,

    /// Path to the embedded index directory
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    #[validate(range(min = 15_000_000))]
    #[serde(default = "default_writer_heap_size")]
    pub writer_heap_size: usize,

    /// Commit after every write
    #[serde(default = "default_true")]
    pub realtime_indexing: bool,

    /// Page sizes at or above this use a scroll cursor
    #[validate(range(min = 1))]
    #[serde(default = "default_page_ceiling")]
    pub page_ceiling: usize,

    /// offset + size at or above this uses a scroll cursor
    #[validate(range(min = 1))]
    #[serde(default = "default_deep_pagination_ceiling")]
    pub deep_pagination_ceiling: usize,

    /// Ids fetched per scroll round trip
    #[validate(range(min = 1, max = 10_000))]
    #[serde(default = "default_page_ceiling")]
    pub scroll_batch_size: usize,

    /// Cursor time-to-live in seconds
    #[validate(range(min = 1, max = 3_600))]
    #[serde(default = "default_scroll_ttl_secs")]
    pub scroll_ttl_secs: u64,

    /// Open cursors the embedded engine keeps at most
    #[validate(range(min = 1))]
    #[serde(default = "default_max_open_cursors")]
    pub max_open_cursors: usize,

    /// Buckets returned per terms facet
    #[validate(range(min = 1, max = 10_000))]
    #[serde(default = "default_facet_bucket_size")]
    pub facet_bucket_size: usize,

    /// Remote Elasticsearch cluster
    #[validate(nested)]
    #[serde(default)]
    pub elasticsearch: Option<ElasticConfig>,

    /// SPARQL endpoint of the triple store
    #[validate(nested)]
    #[serde(default)]
    pub sparql: Option<SparqlConfig>,
}

/// Elasticsearch connection
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ElasticConfig {
    #[validate(url)]
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[validate(range(min = 1))]
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[validate(range(min = 1))]
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

/// SPARQL 1.1 protocol endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SparqlConfig {
    #[validate(url)]
    pub endpoint: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Prefix turning bare ids into resource IRIs
    #[validate(url)]
    #[serde(default = "default_resource_base")]
    pub resource_base: String,

    #[validate(range(min = 1))]
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[validate(range(min = 1))]
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl SearchConfig {
    pub fn scroll_ttl(&self) -> Duration {
        Duration::from_secs(self.scroll_ttl_secs)
    }
}

impl ElasticConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

impl SparqlConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: None,
            password: None,
            resource_base: default_resource_base(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

fn validate_ceilings(config: &SearchConfig) -> Result<(), ValidationError> {
    if config.deep_pagination_ceiling < config.page_ceiling {
        let mut err = ValidationError::new("ceilings");
        err.message = Some("deep_pagination_ceiling must not be below page_ceiling".into());
        return Err(err);
    }
    Ok(())
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/search_index")
}

fn default_writer_heap_size() -> usize {
    50_000_000 // 50MB
}

fn default_true() -> bool {
    true
}

fn default_page_ceiling() -> usize {
    DEFAULT_PAGE_CEILING
}

fn default_deep_pagination_ceiling() -> usize {
    DEFAULT_DEEP_PAGINATION_CEILING
}

fn default_scroll_ttl_secs() -> u64 {
    DEFAULT_SCROLL_TTL_SECS
}

fn default_max_open_cursors() -> usize {
    500
}

fn default_facet_bucket_size() -> usize {
    100
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

fn default_read_timeout_secs() -> u64 {
    120
}

fn default_resource_base() -> String {
    "http://imeji.org/".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_engine: IndexEngineKind::default(),
            index_path: default_index_path(),
            writer_heap_size: default_writer_heap_size(),
            realtime_indexing: true,
            page_ceiling: DEFAULT_PAGE_CEILING,
            deep_pagination_ceiling: DEFAULT_DEEP_PAGINATION_CEILING,
            scroll_batch_size: DEFAULT_PAGE_CEILING,
            scroll_ttl_secs: DEFAULT_SCROLL_TTL_SECS,
            max_open_cursors: default_max_open_cursors(),
            facet_bucket_size: default_facet_bucket_size(),
            elasticsearch: None,
            sparql: None,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_engine(mut self, engine: IndexEngineKind) -> Self {
        self.config.index_engine = engine;
        self
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = path;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn realtime_indexing(mut self, enabled: bool) -> Self {
        self.config.realtime_indexing = enabled;
        self
    }

    pub fn page_ceiling(mut self, ceiling: usize) -> Self {
        self.config.page_ceiling = ceiling;
        self
    }

    pub fn deep_pagination_ceiling(mut self, ceiling: usize) -> Self {
        self.config.deep_pagination_ceiling = ceiling;
        self
    }

    pub fn scroll_batch_size(mut self, size: usize) -> Self {
        self.config.scroll_batch_size = size;
        self
    }

    pub fn scroll_ttl_secs(mut self, secs: u64) -> Self {
        self.config.scroll_ttl_secs = secs;
        self
    }

    pub fn max_open_cursors(mut self, max: usize) -> Self {
        self.config.max_open_cursors = max;
        self
    }

    pub fn facet_bucket_size(mut self, size: usize) -> Self {
        self.config.facet_bucket_size = size;
        self
    }

    pub fn elasticsearch(mut self, elastic: ElasticConfig) -> Self {
        self.config.elasticsearch = Some(elastic);
        self
    }

    pub fn sparql(mut self, sparql: SparqlConfig) -> Self {
        self.config.sparql = Some(sparql);
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scroll_ttl(), Duration::from_secs(60));
        assert_eq!(config.page_ceiling, 500);
        assert_eq!(config.deep_pagination_ceiling, 10_000);
    }

    #[test]
    fn test_ceilings_checked() {
        let config = SearchConfigBuilder::new()
            .page_ceiling(1_000)
            .deep_pagination_ceiling(100)
            .build();
        assert!(config.validate().is_err());

        let config = SearchConfigBuilder::new().scroll_batch_size(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nested_endpoint_validation() {
        let config = SearchConfigBuilder::new()
            .sparql(SparqlConfig::new("not a url"))
            .build();
        assert!(config.validate().is_err());

        let config = SearchConfigBuilder::new()
            .elasticsearch(ElasticConfig::new("http://localhost:9200"))
            .sparql(SparqlConfig::new("http://localhost:3030/catalog/query"))
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"index_engine": "elasticsearch", "page_ceiling": 250}"#)
                .unwrap();
        assert_eq!(config.index_engine, IndexEngineKind::Elasticsearch);
        assert_eq!(config.page_ceiling, 250);
        assert_eq!(config.scroll_batch_size, 500);
    }
}
