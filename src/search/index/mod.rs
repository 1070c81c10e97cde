//! Index-backed search.
//!
//! Queries compile into an engine-neutral [`IndexQuery`] tree split into a base query
//! (visibility, scope, kinds, filters) and a post query (the caller's criteria). Engines
//! run the compiled [`EngineRequest`]: [`EmbeddedIndex`] on a local tantivy index,
//! [`ElasticEngine`] against an Elasticsearch cluster.

mod adapter;
pub mod aggregations;
mod compiler;
mod document;
pub mod dsl;
mod elastic;
mod embedded;
mod engine;

pub use adapter::IndexSearch;
pub use compiler::{index_field, IndexQueryCompiler, ALL_TEXT_FIELDS, BACKEND_NAME};
pub use document::{build_catalog_schema, SearchDocument};
pub use dsl::{
    Aggregation, AggregationSpec, BoolQuery, EngineRequest, EngineResponse, IndexQuery,
    RawAggregation, SortKey,
};
pub use elastic::ElasticEngine;
pub use embedded::{EmbeddedIndex, IndexStats};
pub use engine::{CursorGuard, IndexEngine};
