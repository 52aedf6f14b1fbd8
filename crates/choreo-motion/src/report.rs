//! Comparison report structure.

use choreo_core::{FocusArea, Result};
use serde::{Deserialize, Serialize};

use crate::dtw::Alignment;
use crate::feedback::FeedbackItem;
use crate::movement::MovementAnalysis;

/// Per-metric percentages, one decimal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub pose_accuracy: f64,
    pub timing_accuracy: f64,
    pub movement_smoothness: f64,
    pub angle_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedMetrics {
    /// Per-path-entry pose scores in [0, 1]
    pub frame_similarities: Vec<f64>,
    pub pose_similarity: f64,
    pub timing_similarity: f64,
    pub angle_similarity: f64,
    /// Unweighted diagnostic from joint angles; absent when no aligned pair shares a joint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joint_angle_similarity: Option<f64>,
    pub movement_metrics: MovementAnalysis,
}

/// Full result of one successful comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Weighted score in [0, 100], one decimal
    pub overall_similarity: f64,
    pub similarity_breakdown: SimilarityBreakdown,
    pub feedback_points: Vec<FeedbackItem>,
    pub alignment: Alignment,
    pub detailed_metrics: DetailedMetrics,
    #[serde(default)]
    pub focus_areas: Vec<FocusArea>,
}

/// Reported (non-fatal) failure: no usable frames on one side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonFailure {
    pub error: String,
    pub overall_similarity: f64,
}

/// Either a report or the structured failure; callers must check which
/// before trusting the metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComparisonOutcome {
    Completed(ComparisonReport),
    Failed(ComparisonFailure),
}

impl ComparisonOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        ComparisonOutcome::Failed(ComparisonFailure {
            error: error.into(),
            overall_similarity: 0.0,
        })
    }

    pub fn overall_similarity(&self) -> f64 {
        match self {
            ComparisonOutcome::Completed(report) => report.overall_similarity,
            ComparisonOutcome::Failed(failure) => failure.overall_similarity,
        }
    }

    pub fn report(&self) -> Option<&ComparisonReport> {
        match self {
            ComparisonOutcome::Completed(report) => Some(report),
            ComparisonOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ComparisonOutcome::Completed(_) => None,
            ComparisonOutcome::Failed(failure) => Some(&failure.error),
        }
    }

    pub fn feedback_points(&self) -> &[FeedbackItem] {
        match self {
            ComparisonOutcome::Completed(report) => &report.feedback_points,
            ComparisonOutcome::Failed(_) => &[],
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Fraction in [0, 1] as a one-decimal percentage
pub fn as_percent(fraction: f64) -> f64 {
    round1(fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_wire_shape() {
        let outcome = ComparisonOutcome::failed("no poses");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["error"], "no poses");
        assert_eq!(value["overall_similarity"], 0.0);
        assert_eq!(value.as_object().unwrap().len(), 2);

        let back = ComparisonOutcome::from_json(&outcome.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, outcome);
        assert_eq!(back.error(), Some("no poses"));
        assert!(back.feedback_points().is_empty());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round1(98.74), 98.7);
        assert_eq!(as_percent(0.98765), 98.8);
        assert_eq!(as_percent(1.0), 100.0);
    }
}
