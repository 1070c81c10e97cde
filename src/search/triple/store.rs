//! Triple store access over the SPARQL 1.1 protocol

use crate::search::config::SparqlConfig;
use crate::search::error::{SearchError, SearchResult};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Executes SPARQL SELECT queries
#[async_trait]
pub trait TripleStore: Send + Sync {
    /// Values bound to `?s`, in solution order
    async fn select_subjects(&self, sparql: &str) -> SearchResult<Vec<String>>;

    /// Value bound to `?count` in the first solution
    async fn count(&self, sparql: &str) -> SearchResult<u64>;
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: Bindings,
}

#[derive(Debug, Deserialize)]
struct Bindings {
    bindings: Vec<HashMap<String, Term>>,
}

#[derive(Debug, Deserialize)]
struct Term {
    value: String,
}

/// SPARQL endpoint reached over HTTP
pub struct SparqlHttpStore {
    client: Client,
    config: SparqlConfig,
}

impl SparqlHttpStore {
    pub fn new(config: SparqlConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(|e| {
                SearchError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    pub fn resource_base(&self) -> &str {
        &self.config.resource_base
    }

    async fn query(&self, sparql: &str) -> SearchResult<SparqlResults> {
        tracing::debug!(endpoint = %self.config.endpoint, query = %sparql, "SPARQL query");

        let mut builder = self
            .client
            .post(&self.config.endpoint)
            .header(header::ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", sparql)]);
        if let Some(ref username) = self.config.username {
            builder = builder.basic_auth(username, self.config.password.as_ref());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::TOO_MANY_REQUESTS => {
                    SearchError::BackendUnavailable(format!("HTTP {}: {}", status, body))
                }
                StatusCode::BAD_REQUEST => {
                    SearchError::QueryParsingFailed(format!("Endpoint rejected query: {}", body))
                }
                _ => SearchError::SearchFailed(format!("HTTP {}: {}", status, body)),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TripleStore for SparqlHttpStore {
    async fn select_subjects(&self, sparql: &str) -> SearchResult<Vec<String>> {
        let results = self.query(sparql).await?;
        Ok(results
            .results
            .bindings
            .into_iter()
            .filter_map(|mut row| row.remove("s").map(|term| term.value))
            .collect())
    }

    async fn count(&self, sparql: &str) -> SearchResult<u64> {
        let results = self.query(sparql).await?;
        let Some(term) = results
            .results
            .bindings
            .into_iter()
            .next()
            .and_then(|mut row| row.remove("count"))
        else {
            return Ok(0);
        };
        term.value.parse::<u64>().map_err(|_| {
            SearchError::SearchFailed(format!("Count is not a number: {}", term.value))
        })
    }
}
