//! Kinematic helpers over per-frame landmark series.

use crate::types::{FramePose, LandmarkName};

/// Landmarks whose displacement defines frame-to-frame velocity
pub const VELOCITY_LANDMARKS: [LandmarkName; 4] = [
    LandmarkName::LeftWrist,
    LandmarkName::RightWrist,
    LandmarkName::LeftAnkle,
    LandmarkName::RightAnkle,
];

/// Mean 2D displacement of `landmarks` between two frames, counting only
/// landmarks present in both. 0 when none are shared.
pub fn mean_displacement(
    previous: &FramePose,
    current: &FramePose,
    landmarks: &[LandmarkName],
) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;

    for &name in landmarks {
        if let (Some(p0), Some(p1)) = (previous.get(name), current.get(name)) {
            total += p0.distance_2d(p1);
            count += 1;
        }
    }

    if count > 0 {
        total / count as f64
    } else {
        0.0
    }
}

/// Per-transition velocity of a frame series; a transition touching an
/// absent frame has velocity 0.
pub fn frame_velocities(poses: &[Option<&FramePose>]) -> Vec<f64> {
    poses
        .windows(2)
        .map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) => mean_displacement(prev, curr, &VELOCITY_LANDMARKS),
            _ => 0.0,
        })
        .collect()
}

/// First discrete difference
pub fn differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
