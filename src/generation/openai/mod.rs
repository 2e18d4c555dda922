
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{Generator, build_prompt};
use crate::config::LlmConfig;
use crate::http::{self, HttpFailure};
use crate::{AskError, Result};

/// Client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    completions_url: Url,
    model: String,
    temperature: f32,
    api_key: Option<String>,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiGenerator {
    #[inline]
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let completions_url = config
            .llm_url()
            .map_err(|e| AskError::Config(e.to_string()))?
            .join("chat/completions")
            .map_err(|e| AskError::Config(format!("Invalid completions URL: {}", e)))?;

        Ok(Self {
            completions_url,
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: config.api_key.clone(),
            // completions can take a while; no client-side deadline
            agent: http::agent(None),
        })
    }

    #[inline]
    pub fn completions_url(&self) -> &Url {
        &self.completions_url
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let request = serde_json::to_string(&ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        })
        .map_err(|e| AskError::Generation(format!("Failed to serialize request: {}", e)))?;

        let body = http::post_json(
            &self.agent,
            &self.completions_url,
            self.api_key.as_deref(),
            &request,
        )
        .map_err(|failure| match failure {
            HttpFailure::RateLimited(body) => AskError::RateLimit(body),
            other => AskError::Generation(other.to_string()),
        })?;

        let response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            AskError::Generation(format!("Failed to parse completion response: {}", e))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| AskError::Generation("Completion response had no choices".to_string()))
    }
}

impl Generator for OpenAiGenerator {
    fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        let prompt = build_prompt(question, context);
        debug!(
            "Requesting completion from {} ({} prompt chars)",
            self.model,
            prompt.chars().count()
        );
        self.complete(&prompt)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
