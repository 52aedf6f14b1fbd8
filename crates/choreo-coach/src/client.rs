//! Chat-completion backend.
//!
//! [`CompletionBackend`] is the seam between the coach and whatever produces
//! text. [`OpenAiClient`] speaks the OpenAI-compatible
//! `POST {api_base}/chat/completions` protocol using [`reqwest`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentConfig, AgentError, AgentResult};

/// One chat message
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

/// Chat-completion request body
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub top_p: f32,
    #[serde(skip)]
    pub timeout_ms: u64,
}

impl CompletionRequest {
    pub fn new(config: &AgentConfig, system: &str, user: &str) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            timeout_ms: config.timeout_ms,
        }
    }
}

/// Text returned by a backend
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub tokens_used: usize,
    pub generation_time_ms: u64,
}

/// Anything that turns a chat request into text
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> AgentResult<Completion>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: usize,
}

impl ChatCompletionResponse {
    fn into_completion(self, generation_time_ms: u64) -> AgentResult<Completion> {
        let content = self
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AgentError::LlmError("response contained no choices".to_string()))?;

        Ok(Completion {
            content,
            tokens_used: self.usage.map(|u| u.total_tokens).unwrap_or(0),
            generation_time_ms,
        })
    }
}

/// HTTP client for an OpenAI-compatible chat endpoint
pub struct OpenAiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// * `api_base` - Base URL without trailing slash, e.g. `https://api.openai.com/v1`.
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base, api_key)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling
    pub fn with_client(
        client: reqwest::Client,
        api_base: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn map_transport_error(err: reqwest::Error, timeout_ms: u64) -> AgentError {
        if err.is_timeout() {
            AgentError::Timeout(timeout_ms)
        } else {
            AgentError::LlmError(format!("HTTP request failed: {}", err))
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> AgentResult<Completion> {
        let started = Instant::now();

        let mut builder = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_millis(request.timeout_ms))
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, request.timeout_ms))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::RateLimit);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::LlmError(format!(
                "completion API error ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Self::map_transport_error(e, request.timeout_ms))?;

        parsed.into_completion(started.elapsed().as_millis() as u64)
    }
}
