
use std::sync::Arc;
use tracing::debug;

use crate::database::VectorStore;
use crate::embeddings::{Chunk, Embedder};
use crate::{RagError, Result};

pub const DEFAULT_TOP_K: usize = 4;

/// A stored chunk returned for a query
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub similarity_score: f32,
}

/// Finds the chunks most similar to a query
pub struct Retriever {
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl std::fmt::Debug for Retriever {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("store", &self.store)
            .field("embedder", &self.embedder.model_name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl Retriever {
    /// `embedder` must be the model the store was built with
    #[inline]
    pub fn new(store: VectorStore, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            store,
            embedder,
            top_k,
        }
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Up to `top_k` chunks, most relevant first
    #[inline]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>> {
        let query_vector = self.embedder.embed_query(query).map_err(|e| {
            RagError::Store(format!(
                "Failed to embed query with {}: {:#}",
                self.embedder.model_name(),
                e
            ))
        })?;

        let results = self.store.search(&query_vector, self.top_k).await?;
        debug!("Retrieved {} chunks for query", results.len());

        Ok(results
            .into_iter()
            .map(|result| RetrievedChunk {
                chunk: result.chunk,
                similarity_score: result.similarity_score,
            })
            .collect())
    }
}
