// Database module
// On-disk vector storage for embedded document chunks

pub mod lancedb;

pub use self::lancedb::{
    EmbeddingRecord, OpenOutcome, SearchResult, VectorStore, build_or_load, embed_chunks,
};
