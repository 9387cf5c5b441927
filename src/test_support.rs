// Deterministic stand-ins for the embedding and chat backends, plus PDF fixtures

use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::embeddings::{Chunk, Embedder};
use crate::llm::{ChatMessage, ChatModel, Role};
use crate::loader::Metadata;

pub const HASH_DIMENSIONS: usize = 16;

/// Bag-of-words embedder: each word bumps one hashed bucket, plus a constant
/// bias component so no vector is all zeros
#[derive(Debug, Default)]
pub struct HashEmbedder;

impl HashEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; HASH_DIMENSIONS + 1];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7_usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
                % HASH_DIMENSIONS;
            vector[bucket] += 1.0;
        }
        vector[HASH_DIMENSIONS] = 0.1;
        vector
    }
}

impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-embedder"
    }

    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(Self::vector(text))
    }
}

/// Counts how many documents and queries pass through
#[derive(Debug, Default)]
pub struct CountingEmbedder {
    pub documents: AtomicUsize,
    pub queries: AtomicUsize,
}

impl CountingEmbedder {
    pub fn documents_embedded(&self) -> usize {
        self.documents.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbedder {
    fn model_name(&self) -> &str {
        "counting-embedder"
    }

    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.documents.fetch_add(texts.len(), Ordering::SeqCst);
        HashEmbedder.embed_documents(texts)
    }

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        HashEmbedder.embed_query(text)
    }
}

#[derive(Debug, Default)]
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing-embedder"
    }

    fn embed_documents(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("embedding service unavailable"))
    }

    fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Err(anyhow::anyhow!("embedding service unavailable"))
    }
}

/// Chat model that replays queued replies, then echoes the question
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn with_replies(replies: impl IntoIterator<Item = Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn last_call(&self) -> Vec<ChatMessage> {
        self.calls
            .lock()
            .expect("calls lock")
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted-model"
    }

    fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(messages.to_vec());

        match self.replies.lock().expect("replies lock").pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => {
                let question = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                Ok(format!("Answer to: {}", question))
            }
        }
    }
}

pub fn chunk(content: &str, source: &str, chunk_index: usize) -> Chunk {
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), source.into());
    metadata.insert("page".to_string(), 0_i64.into());
    metadata.insert("chunk_index".to_string(), chunk_index.into());
    Chunk {
        content: content.to_string(),
        metadata,
        chunk_index,
        token_count: crate::embeddings::estimate_token_count(content),
    }
}

pub fn sample_chunks() -> Vec<Chunk> {
    vec![
        chunk("Installation requires running the setup script as administrator.", "guide.pdf", 0),
        chunk("Configuration lives in a TOML file under the home directory.", "guide.pdf", 1),
        chunk("Troubleshooting network errors starts with checking the firewall.", "guide.pdf", 2),
        chunk("The warranty covers hardware defects for two years.", "terms.pdf", 0),
        chunk("Returns are accepted within thirty days of purchase.", "terms.pdf", 1),
    ]
}

/// Write a minimal PDF with one text line per page
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).expect("page count fits");
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("pdf should save");
}
