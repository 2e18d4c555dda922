
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::http::{self, HttpFailure};
use crate::{AskError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Client for an Ollama-compatible `/api/embed` endpoint
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    base_url: Url,
    model: String,
    batch_size: u32,
    api_key: Option<String>,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaEmbedder {
    #[inline]
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base_url = config
            .embedding_url()
            .map_err(|e| AskError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
            api_key: config.api_key.clone(),
            agent: http::agent(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = http::agent(Some(timeout));
        self
    }

    /// Test connection to the embedding server and verify model availability
    #[inline]
    pub fn health_check(&self) -> anyhow::Result<()> {
        debug!("Performing health check for embedding server at {}", self.base_url);

        let models = self.list_models().context("Server ping failed")?;

        if !models.iter().any(|m| m.name == self.model) {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model, available_models
            );
            anyhow::bail!(
                "Model '{}' is not available. Available models: {:?}",
                self.model,
                available_models
            );
        }

        info!(
            "Health check passed for embedding server at {} with model {}",
            self.base_url, self.model
        );
        Ok(())
    }

    /// List all models the server offers
    #[inline]
    pub fn list_models(&self) -> anyhow::Result<Vec<ModelInfo>> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build models URL")?;

        debug!("Fetching available models from {}", url);

        let mut response = self
            .agent
            .get(url.as_str())
            .call()
            .context("Failed to fetch models")?;
        if !response.status().is_success() {
            anyhow::bail!("Model listing failed with HTTP {}", response.status());
        }
        let text = response
            .body_mut()
            .read_to_string()
            .context("Failed to read models response")?;

        let models: ModelsResponse =
            serde_json::from_str(&text).context("Failed to parse models response")?;

        debug!("Found {} models", models.models.len());
        Ok(models.models)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self
            .base_url
            .join("/api/embed")
            .map_err(|e| AskError::Embedding(format!("Failed to build embedding URL: {}", e)))?;

        let request = serde_json::to_string(&EmbedRequest {
            model: &self.model,
            input: texts,
        })
        .map_err(|e| AskError::Embedding(format!("Failed to serialize request: {}", e)))?;

        let body = http::post_json(&self.agent, &url, self.api_key.as_deref(), &request)
            .map_err(|failure| match failure {
                HttpFailure::RateLimited(body) => AskError::RateLimit(body),
                other => AskError::Embedding(other.to_string()),
            })?;

        let response: EmbedResponse = serde_json::from_str(&body)
            .map_err(|e| AskError::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        if response.embeddings.len() != texts.len() {
            return Err(AskError::Embedding(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size as usize) {
            vectors.extend(self.embed_batch(batch)?);
        }

        debug!("Generated {} embeddings total", vectors.len());
        Ok(vectors)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| AskError::Embedding("Empty embedding response".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
