//! Chat-completion backends.
//!
//! Two providers sit behind [`ChatModel`]: any OpenAI-compatible endpoint
//! (Groq by default) and a local Ollama server. Both are blocking HTTP clients.

#[cfg(test)]
mod tests;

pub mod groq;
pub mod ollama;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::config::{Config, LlmProvider};

pub use groq::GroqClient;
pub use ollama::OllamaChatClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        })
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A language model that answers an ordered list of messages
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Return the assistant reply to `messages`
    fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}

/// Construct the chat backend selected by `config.llm.provider`
#[inline]
pub fn build_model(config: &Config) -> Result<Arc<dyn ChatModel>> {
    let model: Arc<dyn ChatModel> = match config.llm.provider {
        LlmProvider::Groq => Arc::new(GroqClient::new(config)?),
        LlmProvider::Ollama => Arc::new(OllamaChatClient::new(config)?),
    };
    Ok(model)
}
