//! Elasticsearch engine over HTTP

use super::aggregations::from_elastic;
use super::dsl::{EngineRequest, EngineResponse};
use super::engine::IndexEngine;
use crate::search::config::ElasticConfig;
use crate::search::error::{SearchError, SearchResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: HitsBody,
    #[serde(default)]
    aggregations: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct HitsBody {
    total: Total,
    #[serde(default)]
    hits: Vec<Hit>,
}

/// `hits.total` is an object since 7.0 and a plain number before
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Total {
    Count(u64),
    Object { value: u64 },
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
}

/// Elasticsearch cluster reached through its REST API
pub struct ElasticEngine {
    client: Client,
    config: ElasticConfig,
}

impl ElasticEngine {
    pub fn new(config: ElasticConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(|e| {
                SearchError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(username) => builder.basic_auth(username, self.config.password.as_ref()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, cursor: Option<&str>) -> SearchResult<Response> {
        let response = self.authorize(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match (status, cursor) {
            (StatusCode::NOT_FOUND, Some(cursor)) => SearchError::CursorExpired(cursor.to_string()),
            (StatusCode::TOO_MANY_REQUESTS, _) | (StatusCode::SERVICE_UNAVAILABLE, _) => {
                SearchError::BackendUnavailable(format!("HTTP {}: {}", status, body))
            }
            _ => SearchError::SearchFailed(format!("HTTP {}: {}", status, body)),
        })
    }

    fn into_response(body: SearchBody, request: Option<&EngineRequest>) -> EngineResponse {
        let total = match body.hits.total {
            Total::Count(count) | Total::Object { value: count } => count,
        };
        let aggregations = match (request, body.aggregations.as_ref()) {
            (Some(request), Some(aggregations)) => from_elastic(&request.aggregations, aggregations),
            _ => Vec::new(),
        };
        EngineResponse {
            ids: body.hits.hits.into_iter().map(|hit| hit.id).collect(),
            total,
            cursor: body.scroll_id,
            aggregations,
        }
    }
}

fn keep_alive(ttl: Duration) -> String {
    format!("{}s", ttl.as_secs().max(1))
}

#[async_trait]
impl IndexEngine for ElasticEngine {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn search(
        &self,
        request: &EngineRequest,
        scroll: Option<Duration>,
    ) -> SearchResult<EngineResponse> {
        let mut url = self.url(&format!("{}/_search", request.indices.join(",")));
        if let Some(ttl) = scroll {
            url = format!("{}?scroll={}", url, keep_alive(ttl));
        }
        tracing::debug!(url = %url, from = request.from, size = request.size, "Elasticsearch search");

        let response = self
            .send(self.client.post(&url).json(&request.to_json()), None)
            .await?;
        let body: SearchBody = response.json().await?;
        Ok(Self::into_response(body, Some(request)))
    }

    async fn scroll(&self, cursor: &str, ttl: Duration) -> SearchResult<EngineResponse> {
        let builder = self
            .client
            .post(self.url("_search/scroll"))
            .json(&json!({ "scroll": keep_alive(ttl), "scroll_id": cursor }));
        let response = self.send(builder, Some(cursor)).await?;
        let body: SearchBody = response.json().await?;
        Ok(Self::into_response(body, None))
    }

    async fn clear_scroll(&self, cursor: &str) -> SearchResult<()> {
        let builder = self
            .client
            .delete(self.url("_search/scroll"))
            .json(&json!({ "scroll_id": [cursor] }));
        match self.send(builder, Some(cursor)).await {
            Ok(_) | Err(SearchError::CursorExpired(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
