//! Retrieval-augmented conversation.
//!
//! A [`Retriever`] finds the stored chunks closest to a question, the prompt
//! helpers frame them for the model, and a [`ConversationalChain`] runs one
//! question/answer turn against a [`ConversationSession`].

pub mod chain;
pub mod prompt;
pub mod retriever;
pub mod session;

pub use chain::{Answer, ConversationalChain};
pub use prompt::{assemble_prompt, format_context};
pub use retriever::{RetrievedChunk, Retriever};
pub use session::ConversationSession;
