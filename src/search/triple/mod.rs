//! Triple-store search over SPARQL

mod adapter;
mod store;
mod templates;

pub use adapter::TripleSearch;
pub use store::{SparqlHttpStore, TripleStore};
pub use templates::{status_iri, SparqlCompiler, BACKEND_NAME};
