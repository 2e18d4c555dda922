// Answer generation
// Prompt assembly, the chat-completion client, and the retrieve-then-generate chain


pub mod openai;

pub use openai::OpenAiGenerator;

use std::sync::Arc;
use tracing::{debug, info};

use crate::Result;
use crate::index::SearchResult;
use crate::retrieval::Retriever;

/// Produces an answer to `question` grounded in the retrieved `context`
pub trait Generator: Send + Sync {
    fn generate(&self, question: &str, context: &[String]) -> Result<String>;

    fn model(&self) -> &str;
}

/// Put every passage into a single prompt ("stuff" strategy).
/// Passages keep retrieval order and are separated by blank lines.
#[inline]
pub fn build_prompt(question: &str, context: &[String]) -> String {
    format!(
        "Use only the following context to answer the question at the end. \
         If the answer is not in the context, say that you don't know instead of making one up.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\
         Helpful answer:",
        context.join("\n\n"),
        question.trim()
    )
}

/// The generated text plus the passages it was grounded on
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SearchResult>,
}

impl Answer {
    /// Distinct source pages in first-seen order
    #[inline]
    pub fn pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            if !pages.contains(&source.chunk.page_number) {
                pages.push(source.chunk.page_number);
            }
        }
        pages
    }
}

/// Retriever and generator bound to one processed document
pub struct RagChain {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
}

impl RagChain {
    #[inline]
    pub fn new(retriever: Retriever, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    #[inline]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// One retrieval plus one generation call, no retries
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let sources = self.retriever.retrieve(question).await?;
        let context: Vec<String> = sources.iter().map(|s| s.chunk.content.clone()).collect();

        debug!(
            "Generating with {} using {} passages",
            self.generator.model(),
            context.len()
        );
        let text = self.generator.generate(question, &context)?;
        info!("Answered question with {} source passages", sources.len());

        Ok(Answer { text, sources })
    }
}

impl std::fmt::Debug for RagChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagChain")
            .field("retriever", &self.retriever)
            .field("generator", &self.generator.model())
            .finish()
    }
}
