//! Agent trait, configuration and errors shared by coaching agents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM inference error: {0}")]
    LlmError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("No completion backend configured")]
    NotConfigured,
}

/// Text-in, text-out agent
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    async fn process(&self, input: &str) -> AgentResult<String>;

    /// Reject blank prompts before they reach a backend
    fn validate_input(&self, input: &str) -> AgentResult<()> {
        match input.trim() {
            "" => Err(AgentError::InvalidInput("empty prompt".to_string())),
            _ => Ok(()),
        }
    }

    /// Trim the output; an empty completion is an error
    fn post_process(&self, output: String) -> AgentResult<String> {
        match output.trim() {
            "" => Err(AgentError::LlmError("empty completion".to_string())),
            trimmed => Ok(trimmed.to_string()),
        }
    }
}

/// Model and sampling parameters. Missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Chat model name
    pub model: String,
    pub temperature: f32,
    /// Completion length cap
    pub max_tokens: usize,
    pub top_p: f32,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 800,
            top_p: 1.0,
            timeout_ms: 30_000,
        }
    }
}

/// Completed agent call with usage metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_name: String,
    pub content: String,
    pub tokens_used: usize,
    pub generation_time_ms: u64,
    pub model: String,
}
