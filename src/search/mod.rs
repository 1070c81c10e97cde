//! Search backends behind one port.
//!
//! Every backend compiles the same query tree into its own query language and answers
//! with a [`ResultEnvelope`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              SearchPort                          │
//! ├─────────────────────────────────────────────────┤
//! │  - search()              - search_with_facets() │
//! │  - multi-level sorting   - search_string()      │
//! └─────────────────────────────────────────────────┘
//!            │                          │
//!            ▼                          ▼
//! ┌────────────────────────┐  ┌────────────────────────┐
//! │      IndexSearch        │  │      TripleSearch       │
//! ├────────────────────────┤  ├────────────────────────┤
//! │  - base/post query      │  │  - SPARQL templates     │
//! │  - facets, counts       │  │  - LIMIT/OFFSET         │
//! │  - scroll cursors       │  │  - shared WHERE clause  │
//! └────────────────────────┘  └────────────────────────┘
//!            │                          │
//!            ▼                          ▼
//! ┌────────────────────────┐  ┌────────────────────────┐
//! │ EmbeddedIndex (tantivy) │  │   SPARQL endpoint       │
//! │ ElasticEngine (HTTP)    │  │   (HTTP)                │
//! └────────────────────────┘  └────────────────────────┘
//! ```
//!
//! [`SearchBackends`] picks the port for a kind from the configuration.
//!
//! # Example
//!
//! ```no_run
//! use catalog_search::models::{Actor, ObjectKind};
//! use catalog_search::query::{parse_query, SortCriterion};
//! use catalog_search::search::{SearchBackends, SearchConfig, Window};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backends = SearchBackends::from_config(SearchConfig::default()).await?;
//!     let items = backends.for_kind(ObjectKind::Item)?;
//!
//!     let query = parse_query("title=\"lake\" AND filetype=image")?;
//!     let actor = Actor::new("user-1");
//!     let result = items
//!         .search_with_facets(&query, &SortCriterion::default(), Some(&actor), None, Window::page(0, 20))
//!         .await?;
//!     println!("{} of {} records", result.len(), result.total);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod factory;
pub mod index;
pub mod port;
pub mod result;
pub mod triple;
pub mod values;

pub use config::{ElasticConfig, IndexEngineKind, SearchConfig, SearchConfigBuilder, SparqlConfig};
pub use error::{SearchError, SearchResult};
pub use factory::SearchBackends;
pub use port::{hydrate, PageSize, RecordHydrator, SearchPort, Window};
pub use result::{FacetResult, FacetValue, ResultEnvelope, ScopeCounts};
