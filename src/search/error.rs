//! Error types for search operations

use crate::error::AppError;
use crate::query::{Operator, QueryParseError, SearchField};

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Query parsing failed
    #[error("Query parsing failed: {0}")]
    QueryParsingFailed(String),

    /// The backend cannot evaluate this field
    #[error("Field '{field}' is not supported by the {backend} backend")]
    UnsupportedField {
        field: SearchField,
        backend: &'static str,
    },

    /// The field does not accept this operator
    #[error("Operator '{}' is not supported for field '{field}'", .operator.symbol())]
    UnsupportedOperator {
        field: SearchField,
        operator: Operator,
    },

    /// The value cannot be interpreted for the field
    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        field: SearchField,
        value: String,
        reason: String,
    },

    /// Backend could not be reached or refused service
    #[error("Search backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend did not answer in time
    #[error("Search backend timed out: {0}")]
    Timeout(String),

    /// Search execution failed
    #[error("Search execution failed: {0}")]
    SearchFailed(String),

    /// Scroll cursor is unknown or past its time-to-live
    #[error("Scroll cursor expired: {0}")]
    CursorExpired(String),

    /// Too many scroll cursors are open
    #[error("Too many open scroll cursors (limit {0})")]
    CursorCapacityExceeded(usize),

    /// Retrieval failed after the cursor was opened; no partial result is returned
    #[error("Scroll aborted: {0}")]
    ScrollAborted(String),

    /// Index initialization failed
    #[error("Index initialization failed: {0}")]
    IndexInitFailed(String),

    /// Document indexing failed
    #[error("Document indexing failed: {0}")]
    IndexingFailed(String),

    /// Document deletion failed
    #[error("Document deletion failed: {0}")]
    DeletionFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Tantivy error
    #[error("Tantivy error: {0}")]
    TantivyError(String),
}

impl SearchError {
    /// True if retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SearchError::BackendUnavailable(_)
                | SearchError::Timeout(_)
                | SearchError::CursorCapacityExceeded(_)
        )
    }
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        SearchError::TantivyError(err.to_string())
    }
}

impl From<tantivy::query::QueryParserError> for SearchError {
    fn from(err: tantivy::query::QueryParserError) -> Self {
        SearchError::QueryParsingFailed(err.to_string())
    }
}

impl From<QueryParseError> for SearchError {
    fn from(err: QueryParseError) -> Self {
        SearchError::QueryParsingFailed(err.to_string())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Timeout(err.to_string())
        } else if err.is_connect() {
            SearchError::BackendUnavailable(err.to_string())
        } else if err.is_decode() {
            SearchError::SearchFailed(format!("Malformed backend response: {}", err))
        } else {
            SearchError::SearchFailed(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for SearchError {
    fn from(err: validator::ValidationErrors) -> Self {
        SearchError::InvalidConfiguration(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            SearchError::QueryParsingFailed(msg) => AppError::Query(msg),
            SearchError::UnsupportedField { .. }
            | SearchError::UnsupportedOperator { .. }
            | SearchError::InvalidValue { .. } => AppError::Validation(err.to_string()),
            SearchError::BackendUnavailable(msg) => AppError::Network(msg),
            SearchError::Timeout(msg) => AppError::Timeout(msg),
            SearchError::IoError(err) => AppError::Io(err),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<QueryParseError> for AppError {
    fn from(err: QueryParseError) -> Self {
        AppError::Query(err.to_string())
    }
}
