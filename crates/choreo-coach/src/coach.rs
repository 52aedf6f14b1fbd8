//! Coach agent: turns a comparison report into natural-language feedback.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use choreo_motion::{ComparisonReport, FeedbackItem};

use crate::agent::{Agent, AgentConfig, AgentError, AgentResponse, AgentResult};
use crate::client::{CompletionBackend, CompletionRequest};
use crate::prompts::{format_coach_input, COACH_SYSTEM_PROMPT};

/// Where the feedback text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachFeedback {
    pub text: String,
    pub source: FeedbackSource,
}

/// Deterministic feedback from the overall score and the feedback points
pub fn fallback_feedback(overall_similarity: f64, feedback_points: &[FeedbackItem]) -> String {
    let mut text = format!("Overall Performance: {:.1}%\n\n", overall_similarity);

    let band = if overall_similarity >= 80.0 {
        "Excellent work! Your choreography closely matches the example."
    } else if overall_similarity >= 65.0 {
        "Good effort! You're on the right track with some areas to improve."
    } else {
        "Keep practicing! There are several areas that need attention."
    };
    text.push_str(band);
    text.push_str("\n\nAreas for Improvement:\n");

    for point in feedback_points.iter().filter(|p| p.is_issue()) {
        let _ = writeln!(text, "- [{}] {}: {}", point.timestamp, point.issue, point.suggestion);
    }

    text
}

/// Coach agent.
///
/// Without a backend every request falls back to canned text.
pub struct CoachAgent {
    config: AgentConfig,
    backend: Option<Arc<dyn CompletionBackend>>,
    name: String,
}

impl CoachAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            backend: None,
            name: "Coach".to_string(),
        }
    }

    pub fn with_backend(config: AgentConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend: Some(backend),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Run one completion and keep its metadata
    pub async fn respond(&self, input: &str) -> AgentResult<AgentResponse> {
        self.validate_input(input)?;
        let backend = self.backend.as_ref().ok_or(AgentError::NotConfigured)?;

        let request = CompletionRequest::new(&self.config, COACH_SYSTEM_PROMPT, input);
        let completion = backend.complete(&request).await?;

        Ok(AgentResponse {
            agent_name: self.name.clone(),
            content: self.post_process(completion.content)?,
            tokens_used: completion.tokens_used,
            generation_time_ms: completion.generation_time_ms,
            model: self.config.model.clone(),
        })
    }

    /// Feedback text for a report. Never fails: any backend problem is
    /// logged and answered with [`fallback_feedback`].
    pub async fn generate_feedback(&self, report: &ComparisonReport) -> CoachFeedback {
        let generated = match format_coach_input(report) {
            Ok(prompt) => self.respond(&prompt).await,
            Err(e) => Err(e),
        };

        match generated {
            Ok(response) => {
                tracing::info!(
                    "coach feedback generated by {} ({} tokens, {}ms)",
                    response.model,
                    response.tokens_used,
                    response.generation_time_ms
                );
                CoachFeedback {
                    text: response.content,
                    source: FeedbackSource::Generated,
                }
            }
            Err(AgentError::NotConfigured) => {
                tracing::debug!("no coach backend configured, using fallback feedback");
                self.fallback(report)
            }
            Err(e) => {
                tracing::warn!("coach backend failed, using fallback feedback: {}", e);
                self.fallback(report)
            }
        }
    }

    fn fallback(&self, report: &ComparisonReport) -> CoachFeedback {
        CoachFeedback {
            text: fallback_feedback(report.overall_similarity, &report.feedback_points),
            source: FeedbackSource::Fallback,
        }
    }
}

#[async_trait]
impl Agent for CoachAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, input: &str) -> AgentResult<String> {
        Ok(self.respond(input).await?.content)
    }
}
