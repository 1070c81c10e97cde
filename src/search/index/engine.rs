//! Index engine abstraction and scroll cursor ownership

use super::dsl::{EngineRequest, EngineResponse};
use crate::search::error::SearchResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Executes compiled requests against an index
#[async_trait]
pub trait IndexEngine: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &'static str;

    /// Run a request. With `scroll` set the engine opens a cursor kept alive for that
    /// long and returns its id with the first batch of `request.size` ids.
    async fn search(
        &self,
        request: &EngineRequest,
        scroll: Option<Duration>,
    ) -> SearchResult<EngineResponse>;

    /// Next batch of an open cursor. An empty batch means the cursor is exhausted.
    async fn scroll(&self, cursor: &str, ttl: Duration) -> SearchResult<EngineResponse>;

    /// Release a cursor
    async fn clear_scroll(&self, cursor: &str) -> SearchResult<()>;
}

/// Owns an open scroll cursor.
///
/// [`release`](Self::release) closes it exactly once. A guard dropped while still
/// holding a cursor spawns the close on the current tokio runtime.
pub struct CursorGuard {
    engine: Arc<dyn IndexEngine>,
    cursor: Option<String>,
}

impl CursorGuard {
    pub fn new(engine: Arc<dyn IndexEngine>, cursor: String) -> Self {
        Self {
            engine,
            cursor: Some(cursor),
        }
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Engines may hand out a new cursor id with every batch
    pub fn advance(&mut self, cursor: String) {
        self.cursor = Some(cursor);
    }

    pub async fn release(mut self) -> SearchResult<()> {
        match self.cursor.take() {
            Some(cursor) => {
                tracing::debug!(engine = self.engine.name(), cursor = %cursor, "Closing scroll cursor");
                self.engine.clear_scroll(&cursor).await
            }
            None => Ok(()),
        }
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        let Some(cursor) = self.cursor.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let engine = Arc::clone(&self.engine);
                handle.spawn(async move {
                    if let Err(e) = engine.clear_scroll(&cursor).await {
                        tracing::warn!(cursor = %cursor, error = %e, "Failed to close abandoned scroll cursor");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(cursor = %cursor, "No runtime to close scroll cursor, leaving it to expire");
            }
        }
    }
}
