//! Language-model client.
//!
//! Talks to an Ollama-style generate endpoint:
//!
//! ```json
//! POST {endpoint}
//! { "model": "gemma2:2b", "prompt": "...", "stream": false }
//! ```
//!
//! and reads the `response` field of the JSON reply. Failures are not
//! raised: they come back in [`ModelReply::error`] as the raw text the user
//! will see, so the presentation layer decides how to show them.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::Result;

/// Text used when a successful reply has no `response` field.
pub const NO_RESPONSE: &str = "No response received.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelReply {
    pub response: Option<String>,
    pub error: Option<String>,
}

impl ModelReply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            response: None,
            error: Some(message.into()),
        }
    }

    /// The text to display: the response, or the error verbatim.
    pub fn display_text(&self) -> &str {
        self.response
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or(NO_RESPONSE)
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> ModelReply;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

pub struct GenerateClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl GenerateClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for GenerateClient {
    async fn generate(&self, prompt: &str) -> ModelReply {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, endpoint = %self.endpoint, "model request failed");
                return ModelReply::failed(format!("Error: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "model returned an error status");
            return ModelReply::failed(format!("Error: {} - {}", status.as_u16(), text));
        }

        match response.json::<GenerateResponse>().await {
            Ok(parsed) => {
                ModelReply::ok(parsed.response.unwrap_or_else(|| NO_RESPONSE.to_string()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "model reply was not valid JSON");
                ModelReply::failed(format!("Error: {}", e))
            }
        }
    }
}
