
use std::sync::Arc;
use tracing::{debug, info};

use crate::llm::{ChatMessage, ChatModel};
use crate::rag::{ConversationSession, RetrievedChunk, Retriever, assemble_prompt, format_context};
use crate::{RagError, Result};

/// Outcome of one conversational turn
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub input: String,
    pub answer: String,
    /// Chunks the answer was conditioned on, most relevant first
    pub context: Vec<RetrievedChunk>,
}

/// Retrieval, prompt assembly and generation for one turn at a time
pub struct ConversationalChain {
    retriever: Retriever,
    model: Arc<dyn ChatModel>,
    system_template: String,
}

impl std::fmt::Debug for ConversationalChain {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationalChain")
            .field("retriever", &self.retriever)
            .field("model", &self.model.model_name())
            .finish_non_exhaustive()
    }
}

impl ConversationalChain {
    #[inline]
    pub fn new(
        retriever: Retriever,
        model: Arc<dyn ChatModel>,
        system_template: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            model,
            system_template: system_template.into(),
        }
    }

    #[inline]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `input` given the history in `session`.
    ///
    /// The user turn and the answer are appended to `session` only when the
    /// whole turn succeeds.
    #[inline]
    pub async fn invoke(&self, session: &mut ConversationSession, input: &str) -> Result<Answer> {
        let context = self.retriever.retrieve(input).await?;
        let messages = assemble_prompt(
            &self.system_template,
            &format_context(&context),
            session.turns(),
            input,
        );

        debug!(
            "Sending {} messages ({} context chunks) to {}",
            messages.len(),
            context.len(),
            self.model.model_name()
        );

        let answer = self.model.complete(&messages).map_err(|e| {
            RagError::Generation(format!(
                "{} failed to answer: {:#}",
                self.model.model_name(),
                e
            ))
        })?;

        session.append(ChatMessage::user(input));
        session.append(ChatMessage::assistant(answer.clone()));
        info!("Answered question using {} context chunks", context.len());

        Ok(Answer {
            input: input.to_string(),
            answer,
            context,
        })
    }
}
