
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::Document;
use crate::config::Config;
use crate::embeddings::{Chunker, Embedder, OllamaEmbedder, SlidingWindowChunker};
use crate::generation::{Generator, OpenAiGenerator, RagChain};
use crate::index::IndexProvider;
use crate::loader::{Loader, PdfLoader};
use crate::retrieval::Retriever;
use crate::{AskError, Result};

/// The substitutable processing stages, shared by every session
#[derive(Clone)]
pub struct Pipeline {
    loader: Arc<dyn Loader>,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    indexes: IndexProvider,
    top_k: usize,
}

impl Pipeline {
    #[inline]
    pub fn new(
        loader: Arc<dyn Loader>,
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        indexes: IndexProvider,
        top_k: usize,
    ) -> Self {
        Self {
            loader,
            chunker,
            embedder,
            generator,
            indexes,
            top_k,
        }
    }

    /// Production stages: lopdf, sliding-window chunks, Ollama embeddings, OpenAI-compatible chat
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AskError::Config(e.to_string()))?;

        Ok(Self::new(
            Arc::new(PdfLoader::new()),
            Arc::new(SlidingWindowChunker::new(&config.chunking)),
            Arc::new(OllamaEmbedder::new(&config.embedding)?),
            Arc::new(OpenAiGenerator::new(&config.llm)?),
            IndexProvider::from_config(config),
            config.retrieval.top_k,
        ))
    }

    #[inline]
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    #[inline]
    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    #[inline]
    pub fn indexes(&self) -> &IndexProvider {
        &self.indexes
    }

    /// Load, chunk, embed and index the file at `path`, then bind a chain to the new index.
    /// A document without any extractable text fails before anything is embedded.
    #[inline]
    pub async fn build_chain(&self, filename: &str, path: &Path) -> Result<(Document, RagChain)> {
        let pages = self.loader.load(path)?;
        debug!("Loaded {} pages from {}", pages.len(), filename);

        let chunks = self.chunker.chunk(&pages);
        if chunks.is_empty() {
            warn!("No extractable text in {} ({} pages)", filename, pages.len());
            return Err(AskError::EmptyContent);
        }

        let document = Document {
            filename: filename.to_string(),
            pages: pages.len(),
            chunks: chunks.len(),
        };

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts)?;

        let mut index = self.indexes.create().await?;
        index.build(chunks, embeddings).await?;

        info!(
            "Indexed {}: {} pages, {} passages, {} backend",
            filename,
            document.pages,
            document.chunks,
            index.backend()
        );

        let retriever = Retriever::new(Arc::clone(&self.embedder), index, self.top_k);
        Ok((document, RagChain::new(retriever, Arc::clone(&self.generator))))
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("embedder", &self.embedder.model())
            .field("generator", &self.generator.model())
            .field("indexes", &self.indexes)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}
