#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::hash::{DefaultHasher, Hash, Hasher};
use tracing::debug;

use crate::loader::PageRecord;

/// A passage of page text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier derived from page, offset and content
    pub id: String,
    /// The passage text
    pub content: String,
    /// Page the passage was taken from (1-based)
    pub page_number: u32,
    /// Position of this chunk within the whole document
    pub chunk_index: usize,
    /// Offset of the first character within the page text, in chars
    pub start_offset: usize,
}

impl Chunk {
    /// Length of the passage in chars
    #[inline]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Configuration for content chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window length in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive windows of the same page
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

/// Splits loaded pages into retrieval passages
pub trait Chunker: Send + Sync {
    fn chunk(&self, pages: &[PageRecord]) -> Vec<Chunk>;
}

/// Fixed-length sliding window, applied page by page
#[derive(Debug, Clone)]
pub struct SlidingWindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SlidingWindowChunker {
    /// Overlap is clamped below the window length so the window always advances
    #[inline]
    pub fn new(config: &ChunkingConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: config.chunk_overlap.min(chunk_size - 1),
        }
    }

    #[inline]
    pub const fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    fn chunk_page(&self, page: &PageRecord, chunk_index: &mut usize, out: &mut Vec<Chunk>) {
        if page.is_blank() {
            debug!("Skipping page {} without text", page.page_number);
            return;
        }

        // Byte offset of every char plus the end of the text, so windows are
        // sliced on char boundaries.
        let boundaries: Vec<usize> = page
            .text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(page.text.len()))
            .collect();
        let char_count = boundaries.len() - 1;

        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            let content = &page.text[boundaries[start]..boundaries[end]];

            out.push(Chunk {
                id: chunk_id(page.page_number, start, content),
                content: content.to_string(),
                page_number: page.page_number,
                chunk_index: *chunk_index,
                start_offset: start,
            });
            *chunk_index += 1;

            if end == char_count {
                break;
            }
            start += self.stride();
        }
    }
}

impl Default for SlidingWindowChunker {
    #[inline]
    fn default() -> Self {
        Self::new(&ChunkingConfig::default())
    }
}

impl Chunker for SlidingWindowChunker {
    fn chunk(&self, pages: &[PageRecord]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0;

        for page in pages {
            self.chunk_page(page, &mut chunk_index, &mut chunks);
        }

        debug!(
            "Chunked {} pages into {} chunks (window {}, overlap {})",
            pages.len(),
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        chunks
    }
}

fn chunk_id(page_number: u32, start: usize, content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    page_number.hash(&mut hasher);
    start.hash(&mut hasher);
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
