// Document loading
// Turns a PDF on disk into ordered per-page text records


use std::path::Path;
use tracing::{debug, info, warn};

use crate::{AskError, Result};

/// Raw text of a single PDF page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// 1-based page number
    pub page_number: u32,
    /// Extracted text, possibly empty for image-only pages
    pub text: String,
}

impl PageRecord {
    #[inline]
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }

    #[inline]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Source of page records for a document on disk
pub trait Loader: Send + Sync {
    /// Load every page of the document at `path`, in page order
    fn load(&self, path: &Path) -> Result<Vec<PageRecord>>;
}

/// PDF loader backed by `lopdf`
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    #[inline]
    pub const fn new() -> Self {
        Self
    }

    /// Load pages from an in-memory PDF
    #[inline]
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<Vec<PageRecord>> {
        let document = lopdf::Document::load_mem(bytes)
            .map_err(|e| AskError::Load(format!("not a readable PDF: {}", e)))?;
        Ok(extract_pages(&document))
    }
}

impl Loader for PdfLoader {
    fn load(&self, path: &Path) -> Result<Vec<PageRecord>> {
        debug!("Loading PDF from {}", path.display());

        if !path.exists() {
            return Err(AskError::Load(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let document = lopdf::Document::load(path)
            .map_err(|e| AskError::Load(format!("{}: {}", path.display(), e)))?;

        let pages = extract_pages(&document);
        info!(
            "Loaded {} pages ({} with text) from {}",
            pages.len(),
            pages.iter().filter(|p| !p.is_blank()).count(),
            path.display()
        );
        Ok(pages)
    }
}

fn extract_pages(document: &lopdf::Document) -> Vec<PageRecord> {
    document
        .get_pages()
        .keys()
        .map(|&page_number| {
            let text = document.extract_text(&[page_number]).unwrap_or_else(|e| {
                warn!("Could not extract text from page {}: {}", page_number, e);
                String::new()
            });
            PageRecord::new(page_number, text)
        })
        .collect()
}
