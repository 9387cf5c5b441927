//! PDF directory loading.
//!
//! Every page of every PDF in a directory becomes one [`Document`]. Files are
//! visited in file-name order and pages in page order so repeated loads of the
//! same directory produce the same sequence.


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{RagError, Result};

/// Scalar metadata value attached to documents and chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl From<&str> for MetadataValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for MetadataValue {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<usize> for MetadataValue {
    #[inline]
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl std::fmt::Display for MetadataValue {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
        }
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// One page of ingested text
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: String,
    pub metadata: Metadata,
}

impl Document {
    #[inline]
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Source file path, if recorded
    #[inline]
    pub fn source(&self) -> Option<&str> {
        match self.metadata.get("source") {
            Some(MetadataValue::String(source)) => Some(source.as_str()),
            _ => None,
        }
    }

    /// Zero-based page index, if recorded
    #[inline]
    pub fn page(&self) -> Option<i64> {
        match self.metadata.get("page") {
            Some(MetadataValue::Integer(page)) => Some(*page),
            _ => None,
        }
    }
}

/// Text extraction backend, one string per page
pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path) -> anyhow::Result<Vec<String>>;
}

/// Extractor backed by `lopdf`
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    #[inline]
    fn extract_pages(&self, path: &Path) -> anyhow::Result<Vec<String>> {
        use anyhow::Context;

        let document = lopdf::Document::load(path)
            .with_context(|| format!("Failed to parse PDF {}", path.display()))?;

        if document.is_encrypted() {
            return Err(anyhow::anyhow!(
                "PDF {} is encrypted and cannot be read",
                path.display()
            ));
        }

        let mut pages = Vec::new();
        for page_number in document.get_pages().into_keys() {
            let text = document.extract_text(&[page_number]).with_context(|| {
                format!(
                    "Failed to extract text from page {} of {}",
                    page_number,
                    path.display()
                )
            })?;
            pages.push(text);
        }

        Ok(pages)
    }
}

/// Load every PDF page under `dir` with the default extractor
#[inline]
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    load_documents_with(dir, &LopdfExtractor)
}

/// Load every PDF page under `dir` using `extractor`
#[inline]
pub fn load_documents_with<E: PdfExtractor + ?Sized>(
    dir: &Path,
    extractor: &E,
) -> Result<Vec<Document>> {
    let files = discover_pdf_files(dir)?;
    debug!("Found {} PDF files in {}", files.len(), dir.display());

    let mut documents = Vec::new();
    for file in &files {
        let pages = extractor.extract_pages(file).map_err(|e| {
            RagError::Load(format!(
                "Error loading documents from {}: {:#}",
                file.display(),
                e
            ))
        })?;

        if pages.is_empty() {
            warn!("PDF {} has no pages", file.display());
        }

        let total_pages = pages.len();
        let source = file.display().to_string();
        for (page, content) in pages.into_iter().enumerate() {
            let mut metadata = Metadata::new();
            metadata.insert("source".to_string(), source.as_str().into());
            metadata.insert("page".to_string(), page.into());
            metadata.insert("total_pages".to_string(), total_pages.into());
            documents.push(Document::new(content, metadata));
        }
    }

    if documents.is_empty() {
        return Err(RagError::Load(format!(
            "No documents found in {}",
            dir.display()
        )));
    }

    info!(
        "Loaded {} pages from {} PDF files in {}",
        documents.len(),
        files.len(),
        dir.display()
    );
    Ok(documents)
}

/// PDF files directly inside `dir`, sorted by file name
#[inline]
pub fn discover_pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RagError::Load(format!(
            "Document directory {} does not exist or is not a directory",
            dir.display()
        )));
    }

    let entries = fs::read_dir(dir).map_err(|e| {
        RagError::Load(format!(
            "Failed to read document directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            RagError::Load(format!("Failed to read entry in {}: {}", dir.display(), e))
        })?;
        let path = entry.path();
        if path.is_file() && is_pdf(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
