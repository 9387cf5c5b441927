// Embeddings module
// Text chunking and the embedding backends used to vectorize chunks and queries

pub mod chunking;
pub mod ollama;

pub use chunking::{Chunk, ChunkingConfig, estimate_token_count, split_documents, split_text};
pub use ollama::{ModelInfo, OllamaClient};

/// Maps text to fixed-length vectors.
///
/// Documents and queries must be embedded by the same model for similarity
/// search to be meaningful.
pub trait Embedder: Send + Sync {
    /// Identifier of the underlying model
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, one vector per input in input order
    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single query string
    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}
