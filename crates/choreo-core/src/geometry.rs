//! Geometric utilities for joint-angle computation.

use std::collections::BTreeMap;

use nalgebra::Vector2;

use crate::types::{FramePose, Joint, Landmark};

/// Added to the norm product so coincident landmarks do not divide by zero
const NORM_EPSILON: f64 = 1e-6;

/// Angle in degrees at `vertex` between the rays towards `a` and `b`.
pub fn angle_between(a: &Landmark, vertex: &Landmark, b: &Landmark) -> f64 {
    let v1 = Vector2::new(a.x - vertex.x, a.y - vertex.y);
    let v2 = Vector2::new(b.x - vertex.x, b.y - vertex.y);

    let cos_angle = v1.dot(&v2) / (v1.norm() * v2.norm() + NORM_EPSILON);
    cos_angle.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Angle at a joint, or `None` when any of its three landmarks is missing
pub fn joint_angle(pose: &FramePose, joint: Joint) -> Option<f64> {
    let [a, vertex, b] = joint.landmarks();
    Some(angle_between(pose.get(a)?, pose.get(vertex)?, pose.get(b)?))
}

/// All joint angles computable from the frame's landmarks
pub fn joint_angles(pose: &FramePose) -> BTreeMap<Joint, f64> {
    Joint::ALL
        .iter()
        .filter_map(|&joint| joint_angle(pose, joint).map(|deg| (joint, deg)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LandmarkName;

    #[test]
    fn test_right_angle() {
        let a = Landmark::new(0.0, 1.0);
        let vertex = Landmark::new(0.0, 0.0);
        let b = Landmark::new(1.0, 0.0);
        assert!((angle_between(&a, &vertex, &b) - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_straight_limb() {
        let a = Landmark::new(0.0, 0.0);
        let vertex = Landmark::new(0.5, 0.5);
        let b = Landmark::new(1.0, 1.0);
        assert!((angle_between(&a, &vertex, &b) - 180.0).abs() < 0.5);
    }

    #[test]
    fn test_missing_landmark_omits_joint() {
        let pose = FramePose::new()
            .with_landmark(LandmarkName::RightHip, Landmark::new(0.5, 0.5))
            .with_landmark(LandmarkName::RightKnee, Landmark::new(0.5, 0.7));

        assert!(joint_angle(&pose, Joint::RightKnee).is_none());
        assert!(joint_angles(&pose).is_empty());
    }
}
