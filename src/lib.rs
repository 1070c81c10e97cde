//! Search-query subsystem for research-data catalogs.
//!
//! Callers build a boolean query tree ([`query::SearchQuery`]) with the
//! [`query::QueryFactory`] or parse it from the textual mini-language, then hand it to a
//! [`search::SearchPort`] implementation together with a sort and a pagination
//! [`search::Window`]. Every backend answers with the same [`search::ResultEnvelope`]: the
//! ordered record ids of the window, totals, and optional facet counts. Records are hydrated
//! by the caller from those ids.
//!
//! Two backend families implement the port:
//!
//! - [`search::index::IndexSearch`]: an inverted-index/aggregation engine, either the
//!   embedded tantivy index ([`search::index::EmbeddedIndex`]) or a remote Elasticsearch
//!   cluster ([`search::index::ElasticEngine`]).
//! - [`search::triple::TripleSearch`]: an RDF triple store queried over the SPARQL protocol.

pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod search;

pub use error::{AppError, Result};
