// Shared plumbing for the JSON-over-HTTP providers (embeddings and chat completions)


use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Markers providers put in error bodies when a quota is exhausted
const RATE_LIMIT_MARKERS: [&str; 4] = [
    "resource exhausted",
    "resource_exhausted",
    "rate limit",
    "rate_limit",
];

/// Outcome of a failed provider call, before it is mapped onto a crate error
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HttpFailure {
    RateLimited(String),
    Status(u16, String),
    Transport(String),
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited(body) => write!(f, "rate limited: {}", body),
            Self::Status(status, body) => write!(f, "HTTP {}: {}", status, body),
            Self::Transport(message) => write!(f, "transport error: {}", message),
        }
    }
}

/// Build an agent that hands non-2xx responses back so their bodies can be classified
pub(crate) fn agent(timeout: Option<Duration>) -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .build()
        .into()
}

pub(crate) fn is_rate_limited(status: u16, body: &str) -> bool {
    if status == 429 {
        return true;
    }
    let body = body.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| body.contains(marker))
}

/// POST a JSON document and return the response body of a 2xx reply.
/// Single attempt: callers surface failures instead of retrying.
pub(crate) fn post_json(
    agent: &ureq::Agent,
    url: &Url,
    api_key: Option<&str>,
    body: &str,
) -> Result<String, HttpFailure> {
    debug!("POST {} ({} bytes)", url, body.len());

    let mut request = agent
        .post(url.as_str())
        .header("Content-Type", "application/json");
    if let Some(key) = api_key {
        request = request.header("Authorization", format!("Bearer {}", key));
    }

    let mut response = request
        .send(body)
        .map_err(|e| HttpFailure::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| HttpFailure::Transport(format!("failed to read response body: {}", e)))?;

    if (200..300).contains(&status) {
        return Ok(text);
    }

    if is_rate_limited(status, &text) {
        warn!("Provider at {} reported quota exhaustion (status {})", url, status);
        return Err(HttpFailure::RateLimited(text));
    }

    warn!("Request to {} failed with status {}", url, status);
    Err(HttpFailure::Status(status, text))
}
