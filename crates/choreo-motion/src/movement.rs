//! Movement dynamics: velocity, smoothness and tempo comparison.
//!
//! ## Velocity
//!
//! Mean 2D displacement of wrists and ankles between consecutive frames,
//! one value per transition.
//!
//! ## Smoothness
//!
//! Discrete jerk is the second difference of the velocity series:
//!
//! ```text
//! smoothness = max(0, 1 - mean(|Δ²v|) · 10)
//! ```
//!
//! Too few samples to form a jerk yields the neutral 0.5.

use choreo_core::{differences, frame_velocities, mean, FramePose};
use serde::{Deserialize, Serialize};

/// Smoothness reported when the series is too short to measure jerk
pub const NEUTRAL_SMOOTHNESS: f64 = 0.5;

/// Jerk scale in the smoothness formula
const JERK_SCALE: f64 = 10.0;

/// Policy thresholds for movement flags
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovementThresholds {
    /// Candidate smoothness below this is flagged stiff
    pub stiffness: f64,
    /// Candidate mean velocity above `fast_ratio ×` reference is too fast
    pub fast_ratio: f64,
    /// Candidate mean velocity below `slow_ratio ×` reference is too slow
    pub slow_ratio: f64,
}

impl Default for MovementThresholds {
    fn default() -> Self {
        Self {
            stiffness: 0.5,
            fast_ratio: 1.3,
            slow_ratio: 0.7,
        }
    }
}

/// Movement comparison of the reference (`example_*`) and candidate
/// (`assignment_*`) performances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementAnalysis {
    pub example_velocities: Vec<f64>,
    pub assignment_velocities: Vec<f64>,
    /// `min(mean) / max(mean)`, 0 when either mean is 0 or a series is empty
    pub velocity_similarity: f64,
    pub example_smoothness: f64,
    pub assignment_smoothness: f64,
    /// `1 - |smoothness_a - smoothness_b|`
    pub smoothness_score: f64,
    pub is_too_stiff: bool,
    pub is_too_fast: bool,
    pub is_too_slow: bool,
}

/// Smoothness of a velocity series in [0, 1]
pub fn smoothness(velocities: &[f64]) -> f64 {
    if velocities.len() < 2 {
        return NEUTRAL_SMOOTHNESS;
    }

    let jerks = differences(&differences(velocities));
    let abs_jerks: Vec<f64> = jerks.iter().map(|j| j.abs()).collect();

    match mean(&abs_jerks) {
        Some(mean_jerk) => (1.0 - mean_jerk * JERK_SCALE).clamp(0.0, 1.0),
        None => NEUTRAL_SMOOTHNESS,
    }
}

/// Ratio of mean velocities in [0, 1]
pub fn velocity_similarity(reference: &[f64], candidate: &[f64]) -> f64 {
    let (Some(mean_ref), Some(mean_cand)) = (mean(reference), mean(candidate)) else {
        return 0.0;
    };
    if mean_ref == 0.0 || mean_cand == 0.0 {
        return 0.0;
    }

    (mean_ref.min(mean_cand) / mean_ref.max(mean_cand)).clamp(0.0, 1.0)
}

/// Movement analyzer
#[derive(Debug, Clone, Default)]
pub struct MovementAnalyzer {
    thresholds: MovementThresholds,
}

impl MovementAnalyzer {
    pub fn new(thresholds: MovementThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &MovementThresholds {
        &self.thresholds
    }

    /// Analyze each sequence independently, then compare tempo and fluidity
    pub fn analyze(
        &self,
        reference: &[Option<&FramePose>],
        candidate: &[Option<&FramePose>],
    ) -> MovementAnalysis {
        let example_velocities = frame_velocities(reference);
        let assignment_velocities = frame_velocities(candidate);

        let example_smoothness = smoothness(&example_velocities);
        let assignment_smoothness = smoothness(&assignment_velocities);

        let velocity_similarity = velocity_similarity(&example_velocities, &assignment_velocities);
        let smoothness_score = 1.0 - (example_smoothness - assignment_smoothness).abs();

        // An empty series has no mean and raises no tempo flag.
        let (is_too_fast, is_too_slow) =
            match (mean(&example_velocities), mean(&assignment_velocities)) {
                (Some(mean_ref), Some(mean_cand)) => (
                    mean_cand > mean_ref * self.thresholds.fast_ratio,
                    mean_cand < mean_ref * self.thresholds.slow_ratio,
                ),
                _ => (false, false),
            };

        tracing::debug!(
            "movement: velocity similarity {:.3}, smoothness {:.3} vs {:.3}",
            velocity_similarity,
            example_smoothness,
            assignment_smoothness
        );

        MovementAnalysis {
            example_velocities,
            assignment_velocities,
            velocity_similarity,
            example_smoothness,
            assignment_smoothness,
            smoothness_score,
            is_too_stiff: assignment_smoothness < self.thresholds.stiffness,
            is_too_fast,
            is_too_slow,
        }
    }
}
