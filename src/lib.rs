use thiserror::Error;

pub type Result<T> = std::result::Result<T, AskError>;

#[derive(Error, Debug)]
pub enum AskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("No extractable text found in document")]
    EmptyContent,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Rate limit reached: {0}")]
    RateLimit(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Upload processing error: {0}")]
    UploadProcessing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl AskError {
    /// Whether the error is a provider quota signal rather than a hard failure
    #[inline]
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimit(_))
    }
}

pub mod chat;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod generation;
mod http;
pub mod index;
pub mod loader;
pub mod retrieval;
pub mod session;
#[cfg(test)]
pub(crate) mod testing;
