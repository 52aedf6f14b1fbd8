//! Comparison orchestrator composing encoder, aligner, scorer, movement
//! analyzer and feedback synthesizer into one report.

use std::borrow::Cow;
use std::collections::BTreeMap;

use choreo_core::{FocusArea, FramePose, Joint, PoseSequence, Result};
use serde::{Deserialize, Serialize};

use crate::dtw::align;
use crate::encoder::{encode_sequence, EncoderConfig};
use crate::feedback::{FeedbackSynthesizer, FeedbackThresholds};
use crate::movement::{MovementAnalyzer, MovementThresholds};
use crate::report::{
    as_percent, ComparisonOutcome, ComparisonReport, DetailedMetrics, SimilarityBreakdown,
};
use crate::similarity::{joint_angle_similarity, score};

/// Message of the failure outcome
pub const NO_POSES_DETECTED: &str = "Could not detect poses in one or both videos";

/// Weights of the overall score. They sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub pose: f64,
    pub timing: f64,
    pub angle: f64,
    pub smoothness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            pose: 0.40,
            timing: 0.25,
            angle: 0.20,
            smoothness: 0.15,
        }
    }
}

impl ScoreWeights {
    /// Weighted sum in [0, 1]
    pub fn combine(&self, pose: f64, timing: f64, angle: f64, smoothness: f64) -> f64 {
        let weighted = self.pose * pose
            + self.timing * timing
            + self.angle * angle
            + self.smoothness * smoothness;
        weighted.clamp(0.0, 1.0)
    }
}

/// Retained frames of one side, in order, with their own timestamps
struct Retained<'a> {
    frames: Vec<Cow<'a, FramePose>>,
    timestamps: Vec<f64>,
}

impl<'a> Retained<'a> {
    fn collect(sequence: &'a PoseSequence, focus: &[FocusArea]) -> Self {
        let narrowing = !focus.is_empty() && !focus.contains(&FocusArea::FullBody);

        // A frame left without landmarks counts as absent
        let (timestamps, frames) = sequence
            .detected_frames()
            .filter_map(|(t, pose)| {
                let frame = if narrowing {
                    Cow::Owned(pose.filtered(focus))
                } else {
                    Cow::Borrowed(pose)
                };
                (!frame.is_empty()).then_some((t, frame))
            })
            .unzip();

        Self { frames, timestamps }
    }

    fn poses(&self) -> Vec<Option<&FramePose>> {
        self.frames.iter().map(|f| Some(f.as_ref())).collect()
    }

    fn angles(&self) -> Vec<BTreeMap<Joint, f64>> {
        self.frames.iter().map(|f| f.angles_or_computed()).collect()
    }

    fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Stateless comparison engine. Every call works only on its inputs, so one
/// engine can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ComparisonEngine {
    encoder: EncoderConfig,
    movement: MovementAnalyzer,
    feedback: FeedbackSynthesizer,
    weights: ScoreWeights,
}

impl ComparisonEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_movement_thresholds(mut self, thresholds: MovementThresholds) -> Self {
        self.movement = MovementAnalyzer::new(thresholds);
        self
    }

    pub fn with_feedback_thresholds(mut self, thresholds: FeedbackThresholds) -> Self {
        self.feedback = FeedbackSynthesizer::new(thresholds);
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Compare a candidate performance against a reference.
    ///
    /// `focus_areas` overrides the reference sequence's own focus tag. No
    /// usable frame on either side is reported as
    /// [`ComparisonOutcome::Failed`], not as an error; `Err` is reserved for
    /// broken encoder invariants.
    pub fn compare(
        &self,
        reference: &PoseSequence,
        candidate: &PoseSequence,
        focus_areas: Option<&[FocusArea]>,
    ) -> Result<ComparisonOutcome> {
        let focus: Vec<FocusArea> = match focus_areas {
            Some(areas) => areas.to_vec(),
            None => reference.focus_areas.clone(),
        };

        let reference_frames = Retained::collect(reference, &focus);
        let candidate_frames = Retained::collect(candidate, &focus);

        tracing::info!(
            "comparing {} reference frames against {} candidate frames",
            reference_frames.frames.len(),
            candidate_frames.frames.len()
        );

        if reference_frames.is_empty() || candidate_frames.is_empty() {
            tracing::info!("comparison aborted: no detected poses on one side");
            return Ok(ComparisonOutcome::failed(NO_POSES_DETECTED));
        }

        let reference_poses = reference_frames.poses();
        let candidate_poses = candidate_frames.poses();

        let features_a = encode_sequence(reference_poses.iter().copied(), &self.encoder);
        let features_b = encode_sequence(candidate_poses.iter().copied(), &self.encoder);

        let alignment = align(&features_a, &features_b)?;
        let similarities = score(&alignment, &features_a, &features_b);

        let angles_a = reference_frames.angles();
        let angles_b = candidate_frames.angles();
        let joint_angles = joint_angle_similarity(&alignment, &angles_a, &angles_b);

        let movement = self.movement.analyze(&reference_poses, &candidate_poses);

        let feedback_points = self.feedback.synthesize(
            &similarities,
            &movement,
            &reference_frames.timestamps,
            &alignment,
        );

        tracing::debug!(
            "pose {:.3}, timing {:.3}, angle {:.3}, smoothness {:.3}",
            similarities.pose_similarity,
            similarities.timing_similarity,
            similarities.angle_similarity,
            movement.smoothness_score
        );

        let overall = self.weights.combine(
            similarities.pose_similarity,
            similarities.timing_similarity,
            similarities.angle_similarity,
            movement.smoothness_score,
        );

        let report = ComparisonReport {
            overall_similarity: as_percent(overall),
            similarity_breakdown: SimilarityBreakdown {
                pose_accuracy: as_percent(similarities.pose_similarity),
                timing_accuracy: as_percent(similarities.timing_similarity),
                movement_smoothness: as_percent(movement.smoothness_score),
                angle_accuracy: as_percent(similarities.angle_similarity),
            },
            feedback_points,
            alignment,
            detailed_metrics: DetailedMetrics {
                frame_similarities: similarities.frame_scores,
                pose_similarity: similarities.pose_similarity,
                timing_similarity: similarities.timing_similarity,
                angle_similarity: similarities.angle_similarity,
                joint_angle_similarity: joint_angles,
                movement_metrics: movement,
            },
            focus_areas: focus,
        };

        tracing::info!(
            "comparison complete: {:.1}% overall, {} feedback points",
            report.overall_similarity,
            report.feedback_points.len()
        );

        Ok(ComparisonOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::NO_ISSUE;
    use choreo_core::{Landmark, LandmarkName};

    fn pose(t: f64, dx: f64) -> FramePose {
        FramePose::new()
            .with_landmark(LandmarkName::LeftWrist, Landmark::new(0.3 + t + dx, 0.4))
            .with_landmark(LandmarkName::RightWrist, Landmark::new(0.7 + t + dx, 0.4 + t))
            .with_landmark(LandmarkName::LeftAnkle, Landmark::new(0.4 + dx, 0.9 - t))
            .with_landmark(LandmarkName::RightAnkle, Landmark::new(0.6 + dx, 0.9))
    }

    fn sequence(frames: usize, step: f64, dx: f64) -> PoseSequence {
        let poses = (0..frames).map(|i| Some(pose(i as f64 * step, dx))).collect();
        PoseSequence::from_frames(poses, 30.0)
    }

    fn completed(outcome: ComparisonOutcome) -> ComparisonReport {
        match outcome {
            ComparisonOutcome::Completed(report) => report,
            ComparisonOutcome::Failed(failure) => panic!("comparison failed: {}", failure.error),
        }
    }

    fn compare_full_body(reference: &PoseSequence, candidate: &PoseSequence) -> ComparisonReport {
        completed(ComparisonEngine::new().compare(reference, candidate, None).unwrap())
    }

    fn wrists_only(t: f64) -> FramePose {
        FramePose::new()
            .with_landmark(LandmarkName::LeftWrist, Landmark::new(0.3 + t, 0.4))
            .with_landmark(LandmarkName::RightWrist, Landmark::new(0.7 + t, 0.4))
    }

    #[test]
    fn test_self_similarity() {
        let seq = sequence(12, 0.01, 0.0);
        let report = compare_full_body(&seq, &seq);

        assert!((report.detailed_metrics.pose_similarity - 1.0).abs() < 1e-9);
        assert_eq!(report.detailed_metrics.timing_similarity, 1.0);
        assert_eq!(report.alignment.normalized_distance, 0.0);
        assert_eq!(report.overall_similarity, 100.0);
        assert_eq!(report.feedback_points.len(), 1);
        assert_eq!(report.feedback_points[0].issue, NO_ISSUE);
        assert_eq!(report.detailed_metrics.joint_angle_similarity, None);
    }

    #[test]
    fn test_constant_offset() {
        let reference = sequence(10, 0.0, 0.0);
        let candidate = sequence(10, 0.0, 0.05);
        let report = compare_full_body(&reference, &candidate);

        let pose = report.detailed_metrics.pose_similarity;
        assert!(pose < 1.0 && pose > 0.99, "pose similarity {}", pose);
        assert!(report.overall_similarity >= 70.0 && report.overall_similarity < 100.0);
        assert!(report
            .feedback_points
            .iter()
            .all(|item| item.issue != "Pose mismatch"));
    }

    #[test]
    fn test_all_absent_frames() {
        let empty = PoseSequence::from_frames(vec![None, None, None], 30.0);
        let outcome = ComparisonEngine::new().compare(&empty, &empty, None).unwrap();

        assert_eq!(outcome.error(), Some(NO_POSES_DETECTED));
        assert_eq!(outcome.overall_similarity(), 0.0);
        assert!(outcome.report().is_none());
    }

    #[test]
    fn test_one_side_absent() {
        let seq = sequence(5, 0.01, 0.0);
        let empty = PoseSequence::from_frames(vec![None; 5], 30.0);
        let outcome = ComparisonEngine::new().compare(&seq, &empty, None).unwrap();
        assert!(outcome.error().is_some());
    }

    #[test]
    fn test_double_speed_flags_too_fast() {
        let reference = sequence(20, 0.01, 0.0);
        let mut poses = reference.poses.clone();
        let halved: Vec<_> = poses.drain(..).step_by(2).collect();
        let candidate = PoseSequence::from_frames(halved, 30.0);

        let report = compare_full_body(&reference, &candidate);
        assert!(report.detailed_metrics.movement_metrics.is_too_fast);
        assert!(report
            .feedback_points
            .iter()
            .any(|item| item.issue == "Movement speed too fast"));
    }

    #[test]
    fn test_absent_frames_keep_their_timestamps_out() {
        let mut reference = sequence(6, 0.0, 0.0);
        reference.poses[0] = None;
        reference.poses[1] = None;
        // far off pose in every candidate frame forces one problem segment
        let candidate = PoseSequence::from_frames(
            (0..4)
                .map(|_| {
                    Some(
                        FramePose::new()
                            .with_landmark(LandmarkName::LeftWrist, Landmark::new(0.0, 0.0))
                            .with_landmark(LandmarkName::RightWrist, Landmark::new(0.0, 0.0))
                            .with_landmark(LandmarkName::LeftAnkle, Landmark::new(0.0, 0.0))
                            .with_landmark(LandmarkName::RightAnkle, Landmark::new(0.0, 0.0)),
                    )
                })
                .collect(),
            1.0,
        );
        // move the reference to a 1 fps clock so frame 2 sits at 00:02
        reference.timestamps = (0..6).map(|i| i as f64).collect();

        let report = compare_full_body(&reference, &candidate);
        let segment = &report.feedback_points[0];
        assert_eq!(segment.issue, "Pose mismatch");
        assert_eq!(segment.timestamp, "00:02 - 00:05");
    }

    #[test]
    fn test_focus_areas_recorded_and_applied() {
        let reference = sequence(8, 0.01, 0.0);
        let candidate = sequence(8, 0.01, 0.0);
        let focus = [FocusArea::Arms];
        let report = completed(
            ComparisonEngine::new()
                .compare(&reference, &candidate, Some(&focus))
                .unwrap(),
        );

        assert_eq!(report.focus_areas, vec![FocusArea::Arms]);
        assert_eq!(report.overall_similarity, 100.0);
        // ankles dropped, so only wrists feed velocities
        assert!(report
            .detailed_metrics
            .movement_metrics
            .example_velocities
            .iter()
            .all(|v| *v > 0.0));
    }

    #[test]
    fn test_focus_removing_every_landmark_fails() {
        let poses = (0..5).map(|i| Some(wrists_only(i as f64 * 0.01))).collect();
        let seq = PoseSequence::from_frames(poses, 30.0);
        let focus = [FocusArea::Legs];

        let outcome = ComparisonEngine::new().compare(&seq, &seq, Some(&focus)).unwrap();
        assert_eq!(outcome.error(), Some(NO_POSES_DETECTED));
        assert_eq!(outcome.overall_similarity(), 0.0);
    }

    #[test]
    fn test_focus_emptied_frames_dropped_like_absent() {
        let mut seq = sequence(6, 0.01, 0.0);
        seq.poses[0] = Some(wrists_only(0.0));
        seq.poses[1] = Some(wrists_only(0.01));
        let focus = [FocusArea::Legs];

        let report = completed(
            ComparisonEngine::new()
                .compare(&seq, &seq, Some(&focus))
                .unwrap(),
        );
        assert_eq!(report.alignment.path, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert_eq!(report.similarity_breakdown.pose_accuracy, 100.0);
        assert_eq!(report.overall_similarity, 100.0);
        assert_eq!(report.feedback_points[0].issue, NO_ISSUE);
    }

    #[test]
    fn test_outputs_bounded() {
        let reference = sequence(15, 0.02, 0.0);
        let candidate = sequence(9, -0.03, 0.2);
        let report = compare_full_body(&reference, &candidate);

        let metrics = &report.detailed_metrics;
        for value in [
            metrics.pose_similarity,
            metrics.timing_similarity,
            metrics.angle_similarity,
            metrics.movement_metrics.smoothness_score,
            metrics.movement_metrics.velocity_similarity,
        ] {
            assert!((0.0..=1.0).contains(&value), "out of range: {}", value);
        }
        assert!((0.0..=100.0).contains(&report.overall_similarity));
        assert!(metrics.frame_similarities.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_report_json_roundtrip() {
        let reference = sequence(10, 0.01, 0.0);
        let candidate = sequence(7, 0.015, 0.02);
        let outcome = ComparisonEngine::new().compare(&reference, &candidate, None).unwrap();

        let json = outcome.to_json_pretty().unwrap();
        let back = ComparisonOutcome::from_json(&json).unwrap();
        assert_eq!(back, outcome);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["similarity_breakdown"]["pose_accuracy"].is_number());
        assert!(value["detailed_metrics"]["movement_metrics"]["is_too_fast"].is_boolean());
        assert!(value["alignment"]["path"][0].is_array());
    }

    #[test]
    fn test_weights_sum_to_one() {
        let w = ScoreWeights::default();
        assert!((w.pose + w.timing + w.angle + w.smoothness - 1.0).abs() < 1e-12);
        assert_eq!(w.combine(1.0, 1.0, 1.0, 1.0), 1.0);
    }
}
