#[cfg(test)]
mod tests;

use crate::llm::ChatMessage;

/// In-memory history of user and assistant turns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationSession {
    turns: Vec<ChatMessage>,
}

impl ConversationSession {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn append(&mut self, turn: ChatMessage) {
        self.turns.push(turn);
    }

    /// Turns in the order they were appended
    #[inline]
    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    #[inline]
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
