//! Text-completion service client
//!
//! Speaks the OpenAI-compatible `POST {base_url}/chat/completions` API with
//! bearer authentication. One request per call: no retry, and no timeout
//! unless `[completion] timeout_secs` is configured.

use crate::error::ExtractionError;
use ferment_common::config::{ApiKeySource, CompletionConfig};
use ferment_common::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Something that turns a prompt into completion text
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError>;
}

/// HTTP chat-completion client
pub struct ChatCompletionClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: ApiKeySource,
}

impl ChatCompletionClient {
    pub fn new(config: &CompletionConfig, api_key: ApiKeySource) -> ferment_common::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
        // Checked before any network I/O
        let api_key = self.api_key.resolve().ok_or_else(|| {
            ExtractionError::ConfigurationMissing(format!(
                "completion API key not set (export {} or set [completion] api_key)",
                self.api_key.env_var()
            ))
        })?;

        debug!("Calling {} with {} chars", self.endpoint, prompt.len());

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.0,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ExtractionError::ServiceUnavailable(format!("completion request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ExtractionError::ServiceUnavailable(format!("reading completion response failed: {}", e))
        })?;

        if !status.is_success() {
            return Err(ExtractionError::ServiceUnavailable(format!(
                "completion service returned {}: {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            ExtractionError::MalformedResponse(format!("unexpected completion envelope: {}", e))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ExtractionError::MalformedResponse("completion contained no choices".to_string())
            })
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
