
use async_trait::async_trait;
use std::cmp::Ordering;
use tracing::{debug, info};

use super::{SearchResult, VectorIndex, validate_batch};
use crate::embeddings::Chunk;
use crate::{AskError, Result};

/// Exact cosine-similarity index held in process memory.
/// Each session owns its own instance, so nothing is shared or locked.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: Vec<Entry>,
    dimension: usize,
}

#[derive(Debug)]
struct Entry {
    chunk: Chunk,
    vector: Vec<f32>,
    norm: f32,
}

impl MemoryIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn build(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        let dimension = validate_batch(&chunks, &embeddings)?;

        self.entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, vector)| {
                let norm = norm(&vector);
                Entry {
                    chunk,
                    vector,
                    norm,
                }
            })
            .collect();
        self.dimension = dimension;

        info!(
            "Built in-memory index with {} passages ({} dimensions)",
            self.entries.len(),
            dimension
        );
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if vector.len() != self.dimension {
            return Err(AskError::Index(format!(
                "Query vector has dimension {}, index expects {}",
                vector.len(),
                self.dimension
            )));
        }

        let query_norm = norm(vector);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine(vector, query_norm, entry)))
            .collect();

        // stable sort keeps document order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        debug!("In-memory query returned {} results", scored.len());

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchResult {
                chunk: self.entries[position].chunk.clone(),
                score,
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

fn norm(vector: &[f32]) -> f32 {
    vector.iter().map(|v| v * v).sum::<f32>().sqrt()
}

fn cosine(query: &[f32], query_norm: f32, entry: &Entry) -> f32 {
    if query_norm == 0.0 || entry.norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = query.iter().zip(&entry.vector).map(|(a, b)| a * b).sum();
    dot / (query_norm * entry.norm)
}
