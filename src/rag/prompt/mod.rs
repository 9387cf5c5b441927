
use itertools::Itertools;

use crate::config::CONTEXT_PLACEHOLDER;
use crate::llm::ChatMessage;
use crate::rag::RetrievedChunk;

/// Join retrieved chunk texts, separated by a blank line
#[inline]
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks.iter().map(|c| c.chunk.content.as_str()).join("\n\n")
}

/// Messages for one turn: the system instruction with `context` substituted,
/// then prior history, then the new user input
#[inline]
pub fn assemble_prompt(
    system_template: &str,
    context: &str,
    history: &[ChatMessage],
    input: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(
        system_template.replace(CONTEXT_PLACEHOLDER, context),
    ));
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(input));
    messages
}
