// Vector index module
// Passage vectors plus nearest-neighbour lookup, behind one trait with two back-ends


pub mod lance;
pub mod memory;

pub use lance::LanceIndex;
pub use memory::MemoryIndex;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::config::{Config, IndexBackend};
use crate::embeddings::Chunk;
use crate::{AskError, Result};

/// A retrieved passage and how close it is to the query (higher is closer)
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Nearest-neighbour index over passage vectors, built once per document
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Replace the index contents with `chunks` and their vectors
    async fn build(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()>;

    /// Top `k` passages ordered by decreasing score
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored passages
    async fn len(&self) -> Result<usize>;

    /// Short name for logs and status output
    fn backend(&self) -> &'static str;
}

/// Creates a fresh index for each processed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexProvider {
    Memory,
    Lance { path: PathBuf },
}

impl IndexProvider {
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        match config.index.backend {
            IndexBackend::Memory => Self::Memory,
            IndexBackend::Lance => Self::Lance {
                path: config.vector_database_path(),
            },
        }
    }

    #[inline]
    pub async fn create(&self) -> Result<Box<dyn VectorIndex>> {
        match self {
            Self::Memory => Ok(Box::new(MemoryIndex::new())),
            Self::Lance { path } => Ok(Box::new(LanceIndex::open(path).await?)),
        }
    }
}

/// Shared input checks for `VectorIndex::build`; returns the vector dimension
pub(crate) fn validate_batch(chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
    if chunks.is_empty() {
        return Err(AskError::Index(
            "Refusing to build an index without passages".to_string(),
        ));
    }

    if chunks.len() != embeddings.len() {
        return Err(AskError::Index(format!(
            "Mismatch between passages and vectors: {} vs {}",
            chunks.len(),
            embeddings.len()
        )));
    }

    let dimension = embeddings[0].len();
    if dimension == 0 {
        return Err(AskError::Index("Embedding vectors are empty".to_string()));
    }

    if let Some(position) = embeddings.iter().position(|v| v.len() != dimension) {
        return Err(AskError::Index(format!(
            "Vector {} has dimension {}, expected {}",
            position,
            embeddings[position].len(),
            dimension
        )));
    }

    Ok(dimension)
}
