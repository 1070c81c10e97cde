//! Backend selection per object kind

use super::config::{IndexEngineKind, SearchConfig};
use super::error::{SearchError, SearchResult};
use super::index::{ElasticEngine, EmbeddedIndex, IndexEngine, IndexSearch};
use super::port::SearchPort;
use super::triple::{SparqlHttpStore, TripleSearch, TripleStore};
use crate::models::{Backend, ObjectKind};
use std::sync::Arc;

/// Engine clients shared by every search port handed out.
///
/// Kinds preferring the triple store fall back to the index engine when no SPARQL
/// endpoint is configured.
pub struct SearchBackends {
    config: SearchConfig,
    engine: Arc<dyn IndexEngine>,
    embedded: Option<Arc<EmbeddedIndex>>,
    triple: Option<Arc<dyn TripleStore>>,
    resource_base: String,
}

impl SearchBackends {
    /// Connect the engines named in `config`
    pub async fn from_config(config: SearchConfig) -> SearchResult<Self> {
        let (engine, embedded) = match config.index_engine {
            IndexEngineKind::Embedded => {
                let index = Arc::new(EmbeddedIndex::new(config.clone()).await?);
                (index.clone() as Arc<dyn IndexEngine>, Some(index))
            }
            IndexEngineKind::Elasticsearch => {
                let elastic = config.elasticsearch.clone().ok_or_else(|| {
                    SearchError::InvalidConfiguration(
                        "index_engine is elasticsearch but [search.elasticsearch] is missing"
                            .to_string(),
                    )
                })?;
                (Arc::new(ElasticEngine::new(elastic)?) as Arc<dyn IndexEngine>, None)
            }
        };

        let (triple, resource_base) = match config.sparql.clone() {
            Some(sparql) => {
                let store = SparqlHttpStore::new(sparql)?;
                let base = store.resource_base().to_string();
                (Some(Arc::new(store) as Arc<dyn TripleStore>), base)
            }
            None => (None, String::new()),
        };

        tracing::info!(
            index_engine = engine.name(),
            triple_store = triple.is_some(),
            "Search backends ready"
        );

        Ok(Self {
            config,
            engine,
            embedded,
            triple,
            resource_base,
        })
    }

    /// Backends over injected engine clients
    pub fn with_engines(
        config: SearchConfig,
        engine: Arc<dyn IndexEngine>,
        triple: Option<(Arc<dyn TripleStore>, String)>,
    ) -> Self {
        let (triple, resource_base) = match triple {
            Some((store, base)) => (Some(store), base),
            None => (None, String::new()),
        };
        Self {
            config,
            engine,
            embedded: None,
            triple,
            resource_base,
        }
    }

    /// The embedded index, for writing records
    pub fn embedded(&self) -> Option<&Arc<EmbeddedIndex>> {
        self.embedded.as_ref()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search port for one kind
    pub fn for_kind(&self, kind: ObjectKind) -> SearchResult<Arc<dyn SearchPort>> {
        self.for_kinds(vec![kind])
    }

    /// Search port across several kinds. All kinds must prefer the same backend.
    pub fn for_kinds(&self, kinds: Vec<ObjectKind>) -> SearchResult<Arc<dyn SearchPort>> {
        let Some(&first) = kinds.first() else {
            return Err(SearchError::InvalidConfiguration(
                "at least one kind is required".to_string(),
            ));
        };
        let backend = first.shape().backend;
        if let Some(other) = kinds.iter().find(|k| k.shape().backend != backend) {
            return Err(SearchError::InvalidConfiguration(format!(
                "kinds {} and {} are served by different backends",
                first, other
            )));
        }

        match (backend, &self.triple) {
            (Backend::Triple, Some(store)) => Ok(Arc::new(TripleSearch::new(
                store.clone(),
                kinds,
                self.resource_base.clone(),
            ))),
            (Backend::Triple, None) => {
                tracing::debug!(kind = %first, "No SPARQL endpoint configured, using the index");
                Ok(Arc::new(IndexSearch::new(self.engine.clone(), kinds, &self.config)))
            }
            (Backend::Index, _) => Ok(Arc::new(IndexSearch::new(
                self.engine.clone(),
                kinds,
                &self.config,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::config::SearchConfigBuilder;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_embedded_backends() {
        let dir = TempDir::new().unwrap();
        let config = SearchConfigBuilder::new()
            .index_path(dir.path().to_path_buf())
            .build();
        let backends = SearchBackends::from_config(config).await.unwrap();

        assert!(backends.embedded().is_some());
        assert!(backends.for_kind(ObjectKind::Item).is_ok());
        // No endpoint configured: users are searched in the index
        assert!(backends.for_kind(ObjectKind::User).is_ok());
        assert!(backends
            .for_kinds(vec![ObjectKind::Item, ObjectKind::User])
            .is_err());
        assert!(backends.for_kinds(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_elasticsearch_requires_connection() {
        let config = SearchConfigBuilder::new()
            .index_engine(IndexEngineKind::Elasticsearch)
            .build();
        assert!(matches!(
            SearchBackends::from_config(config).await,
            Err(SearchError::InvalidConfiguration(_))
        ));
    }
}
