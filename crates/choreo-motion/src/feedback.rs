//! Localized, timestamped feedback from aligned scores and movement flags.

use serde::{Deserialize, Serialize};

use crate::dtw::Alignment;
use crate::movement::MovementAnalysis;
use crate::similarity::SimilarityScores;

/// Timestamp label for feedback that applies to the whole performance
pub const OVERALL: &str = "Overall";

/// Issue label of the positive fallback item
pub const NO_ISSUE: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    None,
}

/// One feedback point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// `"MM:SS - MM:SS"` for a segment, `"Overall"` otherwise
    pub timestamp: String,
    pub issue: String,
    pub severity: Severity,
    pub suggestion: String,
}

impl FeedbackItem {
    fn overall(issue: &str, severity: Severity, suggestion: String) -> Self {
        Self {
            timestamp: OVERALL.to_string(),
            issue: issue.to_string(),
            severity,
            suggestion,
        }
    }

    pub fn is_issue(&self) -> bool {
        self.issue != NO_ISSUE
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeedbackThresholds {
    /// Frames scoring below this form a problem segment
    pub problem_score: f64,
    /// A segment whose mean is below this is high severity
    pub high_severity: f64,
}

impl Default for FeedbackThresholds {
    fn default() -> Self {
        Self {
            problem_score: 0.6,
            high_severity: 0.4,
        }
    }
}

/// Contiguous run of low-scoring aligned frames
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSegment {
    /// Reference timestamp (seconds) of the first frame
    pub start: f64,
    /// Reference timestamp (seconds) of the last frame
    pub end: f64,
    pub scores: Vec<f64>,
}

impl ProblemSegment {
    pub fn mean_score(&self) -> f64 {
        choreo_core::mean(&self.scores).unwrap_or(0.0)
    }
}

/// `MM:SS`, zero-padded
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{:02}:{:02}", minutes, secs)
}

fn percent(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}

/// Feedback synthesizer
#[derive(Debug, Clone, Default)]
pub struct FeedbackSynthesizer {
    thresholds: FeedbackThresholds,
}

impl FeedbackSynthesizer {
    pub fn new(thresholds: FeedbackThresholds) -> Self {
        Self { thresholds }
    }

    /// Scan frame scores in path order and group low-scoring runs.
    /// `reference_timestamps` is indexed by the reference side of the path;
    /// a missing timestamp reads as 0.
    pub fn problem_segments(
        &self,
        frame_scores: &[f64],
        reference_timestamps: &[f64],
        alignment: &Alignment,
    ) -> Vec<ProblemSegment> {
        let mut segments = Vec::new();
        let mut current: Option<ProblemSegment> = None;

        for (k, &score) in frame_scores.iter().enumerate() {
            if score >= self.thresholds.problem_score {
                if let Some(segment) = current.take() {
                    segments.push(segment);
                }
                continue;
            }

            let Some(&(ref_idx, _)) = alignment.path.get(k) else {
                continue;
            };
            let timestamp = reference_timestamps.get(ref_idx).copied().unwrap_or(0.0);

            match current.as_mut() {
                Some(segment) => {
                    segment.end = timestamp;
                    segment.scores.push(score);
                }
                None => {
                    current = Some(ProblemSegment {
                        start: timestamp,
                        end: timestamp,
                        scores: vec![score],
                    });
                }
            }
        }

        segments.extend(current);
        segments
    }

    /// Segments in chronological order, then tempo, then stiffness; a single
    /// positive item when nothing fired.
    pub fn synthesize(
        &self,
        similarities: &SimilarityScores,
        movement: &MovementAnalysis,
        reference_timestamps: &[f64],
        alignment: &Alignment,
    ) -> Vec<FeedbackItem> {
        let mut feedback: Vec<FeedbackItem> = self
            .problem_segments(&similarities.frame_scores, reference_timestamps, alignment)
            .into_iter()
            .map(|segment| {
                let mean_score = segment.mean_score();
                let start = format_time(segment.start);
                let end = format_time(segment.end);
                FeedbackItem {
                    timestamp: format!("{start} - {end}"),
                    issue: "Pose mismatch".to_string(),
                    severity: if mean_score < self.thresholds.high_severity {
                        Severity::High
                    } else {
                        Severity::Medium
                    },
                    suggestion: format!(
                        "Review your positioning during this segment. Pose accuracy: {}%",
                        percent(mean_score)
                    ),
                }
            })
            .collect();

        let tempo_gap = percent(1.0 - movement.velocity_similarity);
        if movement.is_too_fast {
            feedback.push(FeedbackItem::overall(
                "Movement speed too fast",
                Severity::Medium,
                format!("Slow down your movements by ~{}% to match the example tempo", tempo_gap),
            ));
        } else if movement.is_too_slow {
            feedback.push(FeedbackItem::overall(
                "Movement speed too slow",
                Severity::Medium,
                format!("Speed up your movements by ~{}% to match the example tempo", tempo_gap),
            ));
        }

        if movement.is_too_stiff {
            feedback.push(FeedbackItem::overall(
                "Stiff or jerky movements",
                Severity::Medium,
                "Try to move more fluidly and smoothly. Focus on smooth transitions between poses."
                    .to_string(),
            ));
        }

        if feedback.is_empty() {
            feedback.push(FeedbackItem::overall(
                NO_ISSUE,
                Severity::None,
                "Great job! Your choreography closely matches the example.".to_string(),
            ));
        }

        feedback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagonal(n: usize) -> Alignment {
        Alignment {
            distance: 0.0,
            normalized_distance: 0.0,
            path: (0..n).map(|i| (i, i)).collect(),
            alignment_quality: 1.0,
        }
    }

    fn calm_movement() -> MovementAnalysis {
        MovementAnalysis {
            example_velocities: vec![0.01; 4],
            assignment_velocities: vec![0.01; 4],
            velocity_similarity: 1.0,
            example_smoothness: 1.0,
            assignment_smoothness: 1.0,
            smoothness_score: 1.0,
            is_too_stiff: false,
            is_too_fast: false,
            is_too_slow: false,
        }
    }

    fn scores(frame_scores: Vec<f64>) -> SimilarityScores {
        SimilarityScores {
            pose_similarity: 0.0,
            timing_similarity: 1.0,
            angle_similarity: 1.0,
            frame_scores,
        }
    }

    fn timestamps(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 * 10.0).collect()
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(59.9), "00:59");
        assert_eq!(format_time(61.5), "01:01");
        assert_eq!(format_time(600.0), "10:00");
    }

    #[test]
    fn test_positive_fallback_only() {
        let synth = FeedbackSynthesizer::default();
        let items = synth.synthesize(
            &scores(vec![0.9, 0.95, 0.8]),
            &calm_movement(),
            &timestamps(3),
            &diagonal(3),
        );

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].issue, NO_ISSUE);
        assert_eq!(items[0].severity, Severity::None);
        assert_eq!(items[0].timestamp, OVERALL);
    }

    #[test]
    fn test_segments_split_on_good_frame() {
        let synth = FeedbackSynthesizer::default();
        let frame_scores = vec![0.9, 0.3, 0.2, 0.9, 0.5, 0.55, 0.59];
        let items = synth.synthesize(
            &scores(frame_scores),
            &calm_movement(),
            &timestamps(7),
            &diagonal(7),
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].timestamp, "00:10 - 00:20");
        assert_eq!(items[0].severity, Severity::High);
        assert!(items[0].suggestion.ends_with("Pose accuracy: 25%"));

        // trailing run closes at the end of the scan
        assert_eq!(items[1].timestamp, "00:40 - 01:00");
        assert_eq!(items[1].severity, Severity::Medium);
        assert!(items[1].suggestion.ends_with("Pose accuracy: 55%"));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let synth = FeedbackSynthesizer::default();
        let segments = synth.problem_segments(&[0.6, 0.6], &timestamps(2), &diagonal(2));
        assert!(segments.is_empty());
    }

    #[test]
    fn test_segment_uses_reference_index() {
        let synth = FeedbackSynthesizer::default();
        let alignment = Alignment {
            distance: 1.0,
            normalized_distance: 0.1,
            path: vec![(0, 0), (0, 1), (1, 2)],
            alignment_quality: 0.9,
        };
        let segments = synth.problem_segments(&[0.1, 0.1, 0.1], &[5.0, 125.0], &alignment);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, 5.0);
        assert_eq!(segments[0].end, 125.0);
        assert_eq!(segments[0].scores.len(), 3);
    }

    #[test]
    fn test_ordering_segments_tempo_stiffness() {
        let synth = FeedbackSynthesizer::default();
        let mut movement = calm_movement();
        movement.is_too_fast = true;
        movement.is_too_stiff = true;
        movement.velocity_similarity = 0.5;

        let items =
            synth.synthesize(&scores(vec![0.1, 0.9]), &movement, &timestamps(2), &diagonal(2));
        let issues: Vec<&str> = items.iter().map(|i| i.issue.as_str()).collect();
        assert_eq!(
            issues,
            vec!["Pose mismatch", "Movement speed too fast", "Stiff or jerky movements"]
        );
        assert!(items[1].suggestion.contains("~50%"));
        assert!(items.iter().all(FeedbackItem::is_issue));
    }

    #[test]
    fn test_too_slow_message() {
        let synth = FeedbackSynthesizer::default();
        let mut movement = calm_movement();
        movement.is_too_slow = true;
        movement.velocity_similarity = 0.6;

        let items = synth.synthesize(&scores(vec![0.9]), &movement, &timestamps(1), &diagonal(1));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].issue, "Movement speed too slow");
        assert!(items[0].suggestion.starts_with("Speed up your movements by ~40%"));
    }

    #[test]
    fn test_severity_wire_names() {
        let json = serde_json::to_string(&Severity::None).unwrap();
        assert_eq!(json, "\"none\"");
        let json = serde_json::to_string(&Severity::High).unwrap();
        assert_eq!(json, "\"high\"");
    }
}
