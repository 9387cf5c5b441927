
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::loader::{Document, Metadata, MetadataValue};
use crate::{RagError, Result};

/// A bounded window of a document's text, ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The chunk text
    pub content: String,
    /// Parent document metadata plus `chunk_index`
    pub metadata: Metadata,
    /// Position of this chunk within its parent document
    pub chunk_index: usize,
    /// Estimated token count
    pub token_count: usize,
}

/// Configuration for recursive character splitting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Maximum number of characters shared by adjacent chunks
    pub chunk_overlap: usize,
    /// Boundaries tried in order, largest first; `""` splits between characters
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: ["\n\n", "\n", ". ", " ", ""]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ChunkingConfig {
    fn check(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Split("chunk size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Split(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split documents into chunks, preserving document order then position
#[inline]
pub fn split_documents(documents: &[Document], config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    config.check()?;

    let mut chunks = Vec::new();
    for document in documents {
        for (chunk_index, content) in split_text(&document.content, config)?
            .into_iter()
            .enumerate()
        {
            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), MetadataValue::from(chunk_index));
            let token_count = estimate_token_count(&content);
            chunks.push(Chunk {
                content,
                metadata,
                chunk_index,
                token_count,
            });
        }
    }

    debug!(
        "Split {} documents into {} chunks (avg {} tokens)",
        documents.len(),
        chunks.len(),
        chunks.iter().map(|c| c.token_count).sum::<usize>() / chunks.len().max(1)
    );

    Ok(chunks)
}

/// Split a single text into chunks of at most `chunk_size` characters
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    config.check()?;

    let separators: Vec<&str> = config.separators.iter().map(String::as_str).collect();
    Ok(split_recursive(text, &separators, config))
}

fn split_recursive(text: &str, separators: &[&str], config: &ChunkingConfig) -> Vec<String> {
    // First separator present in the text wins; with none left, cut between characters
    let (separator, remaining) = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
        .map_or(("", &[][..]), |i| (separators[i], &separators[i + 1..]));

    let pieces = split_keeping_separator(text, separator);

    let mut chunks = Vec::new();
    let mut mergeable = Vec::new();
    for piece in pieces {
        if char_len(piece) <= config.chunk_size {
            mergeable.push(piece);
            continue;
        }

        if !mergeable.is_empty() {
            chunks.extend(merge_splits(&mergeable, config));
            mergeable.clear();
        }

        if remaining.is_empty() {
            let characters = split_keeping_separator(piece, "");
            chunks.extend(merge_splits(&characters, config));
        } else {
            chunks.extend(split_recursive(piece, remaining, config));
        }
    }

    if !mergeable.is_empty() {
        chunks.extend(merge_splits(&mergeable, config));
    }

    chunks
}

/// Split after every occurrence of `separator`, leaving it on the left piece
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.split_inclusive(|_: char| true).collect()
    } else {
        text.split_inclusive(separator).collect()
    }
}

/// Greedily pack splits into chunks, carrying up to `chunk_overlap`
/// characters of trailing splits into the next chunk
fn merge_splits(splits: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0;

    for split in splits {
        let len = char_len(split);

        if total + len > config.chunk_size && !window.is_empty() {
            push_window(&mut chunks, &window);

            while total > config.chunk_overlap || (total > 0 && total + len > config.chunk_size)
            {
                let Some((_, removed)) = window.pop_front() else {
                    break;
                };
                total -= removed;
            }
        }

        window.push_back((split, len));
        total += len;
    }

    if !window.is_empty() {
        push_window(&mut chunks, &window);
    }

    chunks
}

fn push_window(chunks: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(split, _)| *split).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Estimate token count using a simple heuristic
/// This is a rough approximation - actual tokenization would be more accurate
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}
