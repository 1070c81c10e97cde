//! Backend-agnostic boolean search queries.
//!
//! A query is a tree of [`QueryElement`]s: [`Pair`] leaves (`field operator value`),
//! [`Group`]s joining children with AND or OR, and a top-level [`SearchQuery`] whose
//! elements are AND-joined and which carries a separate filter channel for server-side
//! scoping. Trees are built with the [`QueryFactory`] or parsed from the textual query
//! language (see [`parser`]), and compared with [`QueryElement::is_same`].

mod element;
mod factory;
mod field;
pub mod parser;
mod sort;

pub use element::{FieldKey, Group, Pair, QueryElement, SearchQuery, MAX_ELEMENT_DEPTH};
pub use factory::QueryFactory;
pub use field::{LogicalRelation, MetadataField, Operator, SearchField, ValueType};
pub use parser::{
    parse_or_empty, parse_query, parse_url_query, pretty_print, to_url, QueryParseError,
    QueryParser,
};
pub use sort::{SortCriterion, SortOrder};
