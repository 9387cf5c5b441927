// LanceDB vector database module
// Persists embedded chunks per collection and answers similarity searches

#[cfg(test)]
mod tests;

pub mod vector_store;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::VectorStoreConfig;
use crate::embeddings::{Chunk, Embedder};
use crate::{RagError, Result};

pub use vector_store::{OpenOutcome, SearchResult, VectorStore};

/// Chunks sent to the embedder per progress step
const EMBED_SLICE: usize = 64;

/// A chunk paired with its embedding, as written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub chunk: Chunk,
    /// RFC 3339 creation time
    pub created_at: String,
}

impl EmbeddingRecord {
    #[inline]
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            chunk,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Reuse the persisted collection when possible, otherwise embed `chunks`
/// and build it.
///
/// With `force_rebuild` unset an existing usable collection is returned
/// without embedding anything. A corrupt collection is logged and rebuilt.
#[inline]
pub async fn build_or_load(
    chunks: &[Chunk],
    config: &VectorStoreConfig,
    embedder: &dyn Embedder,
) -> Result<VectorStore> {
    let directory = &config.persist_directory;
    let name = &config.collection_name;

    if config.force_rebuild {
        info!("Rebuild of collection {} requested", name);
    } else {
        match VectorStore::open(directory, name).await {
            OpenOutcome::Opened(store) => {
                info!("Reusing existing collection {}", name);
                return Ok(store);
            }
            OpenOutcome::NotFound => {
                info!("No collection {} in {}, building", name, directory.display());
            }
            OpenOutcome::Corrupt(e) => {
                error!("Collection {} is unusable, rebuilding: {}", name, e);
            }
        }
    }

    if chunks.is_empty() {
        return Err(RagError::Config(
            "No chunks to index; check the document directory and chunking settings".to_string(),
        ));
    }

    let records = embed_chunks(chunks, embedder)?;
    VectorStore::build(directory, name, records).await
}

/// Embed every chunk, preserving order
#[inline]
pub fn embed_chunks(chunks: &[Chunk], embedder: &dyn Embedder) -> Result<Vec<EmbeddingRecord>> {
    let bar = if console::user_attended_stderr() {
        ProgressBar::new(chunks.len() as u64).with_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding chunks {wide_bar}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        )
    } else {
        ProgressBar::hidden()
    };

    let mut records = Vec::with_capacity(chunks.len());
    for slice in chunks.chunks(EMBED_SLICE) {
        let texts: Vec<String> = slice.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_documents(&texts).map_err(|e| {
            RagError::Store(format!(
                "Failed to embed chunks with {}: {:#}",
                embedder.model_name(),
                e
            ))
        })?;

        if vectors.len() != slice.len() {
            return Err(RagError::Store(format!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                slice.len()
            )));
        }

        records.extend(
            slice
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| EmbeddingRecord::new(chunk.clone(), vector)),
        );
        bar.inc(slice.len() as u64);
    }
    bar.finish_and_clear();

    debug!(
        "Embedded {} chunks with {}",
        records.len(),
        embedder.model_name()
    );
    Ok(records)
}
