//! Prompt templates for the coach.

use choreo_motion::ComparisonReport;

use crate::agent::{AgentError, AgentResult};

/// System prompt for the coach
pub const COACH_SYSTEM_PROMPT: &str =
    "You are a supportive dance instructor providing constructive feedback to students.";

/// Template for the coach input built from a comparison report
pub fn format_coach_input(report: &ComparisonReport) -> AgentResult<String> {
    let breakdown = &report.similarity_breakdown;
    let issues = serde_json::to_string_pretty(&report.feedback_points)
        .map_err(|e| AgentError::InvalidInput(e.to_string()))?;

    Ok(format!(
        r#"You are a dance instructor reviewing a student's choreography performance.
Generate constructive, encouraging, and specific feedback based on these metrics:

Overall Match: {:.1}%

Performance Breakdown:
- Pose Accuracy: {:.1}%
- Timing Accuracy: {:.1}%
- Movement Smoothness: {:.1}%
- Angle Accuracy: {:.1}%

Specific Issues Found:
{}

Generate feedback that:
1. Starts with a brief overall assessment
2. Highlights what they did well
3. Provides 3-5 specific, actionable improvements with timestamps
4. Ends with encouragement

Keep the tone supportive and motivating. Be specific about what movements need work."#,
        report.overall_similarity,
        breakdown.pose_accuracy,
        breakdown.timing_accuracy,
        breakdown.movement_smoothness,
        breakdown.angle_accuracy,
        issues
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use choreo_core::{FramePose, Landmark, LandmarkName, PoseSequence};
    use choreo_motion::ComparisonEngine;

    pub(crate) fn sample_report(shift: f64) -> ComparisonReport {
        let poses = |dx: f64| {
            (0..8)
                .map(|i| {
                    let t = i as f64 * 0.01;
                    let wrist = Landmark::new(0.3 + t + dx, 0.4);
                    let ankle = Landmark::new(0.6 + dx, 0.9 - t);
                    Some(
                        FramePose::new()
                            .with_landmark(LandmarkName::LeftWrist, wrist)
                            .with_landmark(LandmarkName::RightAnkle, ankle),
                    )
                })
                .collect()
        };
        let reference = PoseSequence::from_frames(poses(0.0), 30.0);
        let candidate = PoseSequence::from_frames(poses(shift), 30.0);

        match ComparisonEngine::new().compare(&reference, &candidate, None).unwrap() {
            choreo_motion::ComparisonOutcome::Completed(report) => report,
            choreo_motion::ComparisonOutcome::Failed(f) => panic!("{}", f.error),
        }
    }

    #[test]
    fn test_format_coach_input() {
        let report = sample_report(0.0);
        let input = format_coach_input(&report).unwrap();

        assert!(input.contains("Overall Match: 100.0%"));
        assert!(input.contains("- Pose Accuracy: 100.0%"));
        assert!(input.contains("\"issue\": \"None\""));
        assert!(input.contains("3-5 specific, actionable improvements"));
    }
}
