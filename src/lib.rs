use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Load error: {0}")]
    Load(String),

    #[error("Split error: {0}")]
    Split(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Pipeline is not initialized")]
    NotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<config::ConfigError> for RagError {
    #[inline]
    fn from(error: config::ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod http;
pub mod llm;
pub mod loader;
pub mod rag;

#[cfg(test)]
pub(crate) mod test_support;
