//! Similarity metrics over an alignment path.

use std::collections::BTreeMap;

use choreo_core::Joint;
use serde::{Deserialize, Serialize};

use crate::dtw::Alignment;
use crate::encoder::FeatureVector;

/// Pose, timing and coordinate-distance similarity, each in [0, 1]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScores {
    /// Mean per-frame cosine similarity
    pub pose_similarity: f64,
    /// Alignment quality, a proxy for tempo correctness
    pub timing_similarity: f64,
    /// Coordinate-distance proxy, `1 - euclidean / 2` averaged over the path.
    /// Does not use joint angles.
    pub angle_similarity: f64,
    /// One score per path entry, in path order
    pub frame_scores: Vec<f64>,
}

fn mean_or_zero(values: &[f64]) -> f64 {
    choreo_core::mean(values).unwrap_or(0.0)
}

/// Score an alignment. Path pairs outside either sequence score 0 and are
/// left out of the angle proxy.
pub fn score(alignment: &Alignment, a: &[FeatureVector], b: &[FeatureVector]) -> SimilarityScores {
    if alignment.path.is_empty() || a.is_empty() || b.is_empty() {
        return SimilarityScores::default();
    }

    let mut frame_scores = Vec::with_capacity(alignment.path.len());
    let mut distance_scores = Vec::with_capacity(alignment.path.len());

    for &(i, j) in &alignment.path {
        match (a.get(i), b.get(j)) {
            (Some(fa), Some(fb)) => {
                frame_scores.push((1.0 - fa.cosine_distance(fb)).max(0.0));
                distance_scores.push(fa.euclidean(fb));
            }
            _ => frame_scores.push(0.0),
        }
    }

    let angle_similarity = if distance_scores.is_empty() {
        0.0
    } else {
        (1.0 - mean_or_zero(&distance_scores) / 2.0).max(0.0)
    };

    SimilarityScores {
        // Floating-point cosine can exceed 1 by an ulp.
        pose_similarity: mean_or_zero(&frame_scores).min(1.0),
        timing_similarity: alignment.alignment_quality.clamp(0.0, 1.0),
        angle_similarity,
        frame_scores: frame_scores.into_iter().map(|s| s.min(1.0)).collect(),
    }
}

/// Joint-angle agreement over the path: `1 - mean|Δθ| / 180` per pair,
/// averaged over pairs that share at least one joint. `None` when no pair does.
pub fn joint_angle_similarity(
    alignment: &Alignment,
    a: &[BTreeMap<Joint, f64>],
    b: &[BTreeMap<Joint, f64>],
) -> Option<f64> {
    let per_pair: Vec<f64> = alignment
        .path
        .iter()
        .filter_map(|&(i, j)| {
            let (angles_a, angles_b) = (a.get(i)?, b.get(j)?);
            let diffs: Vec<f64> = angles_a
                .iter()
                .filter_map(|(joint, deg)| angles_b.get(joint).map(|other| (deg - other).abs()))
                .collect();
            let mean_diff = choreo_core::mean(&diffs)?;
            Some((1.0 - mean_diff / 180.0).clamp(0.0, 1.0))
        })
        .collect();

    choreo_core::mean(&per_pair)
}
