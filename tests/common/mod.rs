// Shared fixtures for integration tests

#![allow(dead_code, reason = "each test binary uses a different subset")]

use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};
use rag_chat::embeddings::Embedder;
use rag_chat::llm::{ChatMessage, ChatModel, Role};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

const DIMENSIONS: usize = 32;

/// Hashed bag-of-words vectors; texts sharing words end up close
#[derive(Debug, Default)]
pub struct BagOfWordsEmbedder {
    pub documents: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn documents_embedded(&self) -> usize {
        self.documents.load(Ordering::SeqCst)
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSIONS + 1];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(17_usize, |acc, b| acc.wrapping_mul(131).wrapping_add(b as usize))
                % DIMENSIONS;
            vector[bucket] += 1.0;
        }
        vector[DIMENSIONS] = 0.05;
        vector
    }
}

impl Embedder for BagOfWordsEmbedder {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }

    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.documents.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(Self::vector(text))
    }
}

/// Answers with the first context line of the system prompt, or fails on request
#[derive(Debug, Default)]
pub struct ContextEchoModel {
    pub fail_next: Mutex<bool>,
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ChatModel for ContextEchoModel {
    fn model_name(&self) -> &str {
        "context-echo"
    }

    fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(messages.to_vec());

        let mut fail = self.fail_next.lock().expect("fail lock");
        if *fail {
            *fail = false;
            return Err(anyhow::anyhow!("model overloaded"));
        }

        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let context_line = system
            .lines()
            .skip(1)
            .find(|line| !line.trim().is_empty())
            .unwrap_or("I don't know.");
        Ok(format!("According to the documents: {}", context_line.trim()))
    }
}

/// Write a minimal PDF with one line of text per page
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 11.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        kids.push(
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
            .into(),
        );
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
