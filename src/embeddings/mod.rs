// Embeddings module
// Text chunking plus the embedding capability the index is built from

pub mod chunking;
pub mod ollama;

pub use chunking::{Chunk, Chunker, ChunkingConfig, SlidingWindowChunker};
pub use ollama::OllamaEmbedder;

use crate::Result;

/// Maps text to fixed-dimension vectors
pub trait Embedder: Send + Sync {
    /// Embed a batch of passages, one vector per input, in input order
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single question
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Identifier of the model producing the vectors
    fn model(&self) -> &str;
}
