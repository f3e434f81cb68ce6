//! Completion Providers
//!
//! Defines the completion trait and the OpenAI chat-completions client.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::CompletionConfig;

/// Completion error types
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("request to completion service failed: {0}")]
    Transport(String),

    #[error("completion service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse completion response: {0}")]
    InvalidResponse(String),
}

/// Text completion backend.
///
/// Returns the raw response body so callers can decode whichever layout the
/// backend produced.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<Value, CompletionError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI chat-completions client
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &CompletionConfig, api_key: &str) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<Value, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            stream: false,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or(body);
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))
    }
}

/// Mock completion provider for testing
#[cfg(test)]
pub struct MockCompletion {
    pub response: Result<Value, String>,
}

#[cfg(test)]
impl MockCompletion {
    /// Respond with a chat completion whose message content is `text`
    pub fn replying(text: &str) -> Self {
        Self {
            response: Ok(serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]
            })),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CompletionProvider for MockCompletion {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _system_prompt: &str, _user_content: &str) -> Result<Value, CompletionError> {
        self.response.clone().map_err(|message| CompletionError::Api {
            status: 429,
            message,
        })
    }
}
