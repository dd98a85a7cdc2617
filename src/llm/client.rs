//! Chat-completion client for an OpenAI-compatible endpoint.

use crate::config::LlmConfig;
use crate::models::ConnectionStatus;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("No LLM API key configured. Set llm.api_key in .brandbuddy.toml or OPENAI_API_KEY")]
    NotConfigured,

    #[error("LLM API error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to LLM service at {0}")]
    Connect(String),

    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected completion payload: {0}")]
    Decode(String),
}

/// Message in the chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

const CONNECTION_PHRASE: &str = "LLM connection successful";

pub struct CompletionClient {
    config: LlmConfig,
    http_client: reqwest::Client,
}

impl CompletionClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    /// Send a role-tagged message list and return the first completion's text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured);
        }

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(
            "Sending completion request with {} messages to {}",
            messages.len(),
            self.config.model
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    LlmError::Connect(self.config.base_url.clone())
                } else {
                    LlmError::Transport(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Decode("response has no choices".to_string()))
    }

    /// Ask the model to echo a fixed phrase.
    pub async fn test_connection(&self) -> ConnectionStatus {
        let messages = [ChatMessage::user(format!(
            "Say '{}' if this works.",
            CONNECTION_PHRASE
        ))];

        match self.complete(&messages).await {
            Ok(reply) => {
                let success = reply.contains(CONNECTION_PHRASE);
                ConnectionStatus {
                    success,
                    rows: None,
                    error: None,
                    message: if success {
                        reply
                    } else {
                        "Model replied but did not confirm the connection".to_string()
                    },
                }
            }
            Err(e) => {
                warn!("LLM connection test failed: {}", e);
                ConnectionStatus {
                    success: false,
                    rows: None,
                    error: Some(e.to_string()),
                    message: "LLM API connection failed".to_string(),
                }
            }
        }
    }
}
