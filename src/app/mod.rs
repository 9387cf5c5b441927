//! Application state behind the CLI.
//!
//! [`RagApp`] owns the configuration, the provider clients, the retrieval
//! chain once built, and the single conversation session. It is either
//! [`AppState::Uninitialized`] or [`AppState::Ready`]; only a successful
//! [`RagApp::initialize`] makes it ready.


use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::database::build_or_load;
use crate::embeddings::{Embedder, OllamaClient, split_documents};
use crate::llm::{ChatModel, build_model};
use crate::loader::load_documents;
use crate::rag::{Answer, ConversationSession, ConversationalChain, Retriever};
use crate::{RagError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Uninitialized,
    Ready,
}

impl fmt::Display for AppState {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
        })
    }
}

/// Counts from a successful initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    pub documents: usize,
    pub chunks: usize,
    pub stored: usize,
}

pub struct RagApp {
    config: Config,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    chain: Option<ConversationalChain>,
    session: ConversationSession,
}

impl fmt::Debug for RagApp {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagApp")
            .field("state", &self.state())
            .field("embedder", &self.embedder.model_name())
            .field("model", &self.model.model_name())
            .field("turns", &self.session.len())
            .finish_non_exhaustive()
    }
}

impl RagApp {
    #[inline]
    pub fn new(config: Config, embedder: Arc<dyn Embedder>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            config,
            embedder,
            model,
            chain: None,
            session: ConversationSession::new(),
        }
    }

    /// Build the Ollama embedder and the configured chat backend from `config`
    #[inline]
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaClient::new(&config)?);
        let model = build_model(&config)?;
        Ok(Self::new(config, embedder, model))
    }

    #[inline]
    pub fn state(&self) -> AppState {
        if self.chain.is_some() {
            AppState::Ready
        } else {
            AppState::Uninitialized
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Load, split and index the documents, then build the retrieval chain.
    ///
    /// Any previous pipeline is discarded first, so a failure always leaves
    /// the app uninitialized. History is kept.
    #[inline]
    pub async fn initialize(&mut self) -> Result<IndexSummary> {
        self.chain = None;

        match self.build_chain().await {
            Ok((chain, summary)) => {
                self.chain = Some(chain);
                info!(
                    "Pipeline ready: {} pages, {} chunks, {} stored records",
                    summary.documents, summary.chunks, summary.stored
                );
                Ok(summary)
            }
            Err(e) => {
                error!("Initialization failed: {}", e);
                Err(e)
            }
        }
    }

    async fn build_chain(&self) -> Result<(ConversationalChain, IndexSummary)> {
        self.config.validate()?;

        let documents = load_documents(&self.config.documents.path)?;
        let chunks = split_documents(&documents, &self.config.chunking)?;
        let store =
            build_or_load(&chunks, &self.config.vector_store, self.embedder.as_ref()).await?;
        let stored = store.count().await?;

        let retriever = Retriever::new(
            store,
            Arc::clone(&self.embedder),
            self.config.vector_store.top_k,
        );
        let chain = ConversationalChain::new(
            retriever,
            Arc::clone(&self.model),
            self.config.prompt.system_template.clone(),
        );

        Ok((
            chain,
            IndexSummary {
                documents: documents.len(),
                chunks: chunks.len(),
                stored,
            },
        ))
    }

    /// Run one conversational turn
    #[inline]
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let chain = self.chain.as_ref().ok_or(RagError::NotInitialized)?;
        chain.invoke(&mut self.session, question).await
    }

    #[inline]
    pub fn reset_history(&mut self) {
        self.session.reset();
        info!("Conversation history cleared");
    }

    /// Drop the pipeline; `initialize` must run again before `ask`
    #[inline]
    pub fn reset_pipeline(&mut self) {
        self.chain = None;
        info!("Pipeline reset");
    }
}
