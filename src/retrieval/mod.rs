
use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::embeddings::Embedder;
use crate::index::{SearchResult, VectorIndex};

/// "Top-k passages for a question" over one document's index
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Box<dyn VectorIndex>,
    top_k: usize,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, index: Box<dyn VectorIndex>, top_k: usize) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }

    #[inline]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    /// Embed the question and return the closest passages, best first
    #[inline]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        let vector = self.embedder.embed_query(question)?;
        let results = self.index.query(&vector, self.top_k).await?;

        debug!(
            "Retrieved {} passages from {} index (pages {:?})",
            results.len(),
            self.index.backend(),
            results
                .iter()
                .map(|r| r.chunk.page_number)
                .collect::<Vec<_>>()
        );

        Ok(results)
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("model", &self.embedder.model())
            .field("backend", &self.index.backend())
            .field("top_k", &self.top_k)
            .finish()
    }
}
