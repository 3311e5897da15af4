// Search mirror: a secondary, eventually consistent copy of a resource
//
// Writes go to the store first; the mirror follows. Index and remove
// failures leave the mirror stale and are only logged, while a failing query
// is the request itself and is returned to the caller.

pub mod elastic;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::Entity;

pub use elastic::ElasticsearchEngine;
pub use memory::MemorySearchEngine;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search engine request failed: {0}")]
    Transport(String),

    #[error("Search engine answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Cannot decode search response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SearchError::Decode(e.to_string())
        } else {
            SearchError::Transport(e.to_string())
        }
    }
}

/// Full-text index of one entity type
#[async_trait]
pub trait SearchEngine<E: Entity>: Send + Sync {
    /// Index the full record under `id`, replacing any previous document
    async fn index(&self, id: i64, record: &E) -> Result<(), SearchError>;

    async fn delete(&self, id: i64) -> Result<(), SearchError>;

    /// Free-text query; results keep the engine's relevance order
    async fn query(&self, query: &str) -> Result<Vec<E>, SearchError>;
}

/// Keeps a search index in step with the store
pub struct SearchMirror<E: Entity> {
    engine: Arc<dyn SearchEngine<E>>,
}

impl<E: Entity> Clone for SearchMirror<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<E: Entity> SearchMirror<E> {
    pub fn new(engine: Arc<dyn SearchEngine<E>>) -> Self {
        Self { engine }
    }

    /// Returns whether the index accepted the document
    pub async fn reindex(&self, record: &E) -> bool {
        let Some(id) = record.id() else {
            tracing::error!(index = E::NAME, "Cannot index a record without id");
            return false;
        };

        match self.engine.index(id, record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(index = E::NAME, id, error = %e, "Search index not updated");
                false
            }
        }
    }

    pub async fn remove(&self, id: i64) -> bool {
        match self.engine.delete(id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(index = E::NAME, id, error = %e, "Search document not removed");
                false
            }
        }
    }

    pub async fn query(&self, query: &str) -> Result<Vec<E>, SearchError> {
        self.engine.query(query).await
    }
}
