//! Feature encoding of frame poses.
//!
//! A frame becomes a fixed-length vector of `x, y` pairs taken from its
//! landmarks in lexicographic name order, zero-padded (or truncated) to the
//! configured length. Because the length never depends on which landmarks
//! were tracked, sequences captured with different focus areas stay
//! comparable component-wise. A missing frame encodes as the zero vector.

use choreo_core::{FramePose, LandmarkName};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// 33 landmarks × (x, y)
pub const DEFAULT_VECTOR_LENGTH: usize = 66;

/// Fixed-length numeric encoding of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(DVector<f64>);

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self(DVector::zeros(len))
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self(DVector::from_vec(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn euclidean(&self, other: &Self) -> f64 {
        self.0.metric_distance(&other.0)
    }

    /// `1 - cos(θ)`; a zero vector has no direction, so its distance to
    /// anything is the neutral 1.
    pub fn cosine_distance(&self, other: &Self) -> f64 {
        let denom = self.norm() * other.norm();
        if denom <= f64::EPSILON {
            return 1.0;
        }
        1.0 - self.dot(other) / denom
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub vector_length: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            vector_length: DEFAULT_VECTOR_LENGTH,
        }
    }
}

/// Landmark names sorted by their wire name
fn lexicographic_order() -> [LandmarkName; LandmarkName::COUNT] {
    let mut names = LandmarkName::ALL;
    names.sort_by_key(|name| name.as_str());
    names
}

/// Encode one frame into a vector of exactly `vector_length` components
pub fn encode(frame: Option<&FramePose>, vector_length: usize) -> FeatureVector {
    let Some(pose) = frame else {
        return FeatureVector::zeros(vector_length);
    };

    let mut values = Vec::with_capacity(vector_length);
    for name in lexicographic_order() {
        if values.len() >= vector_length {
            break;
        }
        if let Some(lm) = pose.get(name) {
            values.push(lm.x);
            values.push(lm.y);
        }
    }
    values.resize(vector_length, 0.0);

    FeatureVector::from_values(values)
}

/// Encode a whole frame series with a shared vector length
pub fn encode_sequence<'a, I>(frames: I, config: &EncoderConfig) -> Vec<FeatureVector>
where
    I: IntoIterator<Item = Option<&'a FramePose>>,
{
    frames
        .into_iter()
        .map(|frame| encode(frame, config.vector_length))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_core::Landmark;

    #[test]
    fn test_missing_frame_is_zero_vector() {
        let v = encode(None, DEFAULT_VECTOR_LENGTH);
        assert_eq!(v.len(), 66);
        assert!(v.as_slice().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_lexicographic_order_and_padding() {
        let pose = FramePose::new()
            .with_landmark(LandmarkName::RightWrist, Landmark::new(0.9, 0.8))
            .with_landmark(LandmarkName::LeftAnkle, Landmark::new(0.1, 0.2))
            .with_landmark(LandmarkName::Nose, Landmark::new(0.5, 0.6));

        let v = encode(Some(&pose), 66);
        assert_eq!(v.len(), 66);
        // left_ankle < nose < right_wrist
        assert_eq!(&v.as_slice()[..6], &[0.1, 0.2, 0.5, 0.6, 0.9, 0.8]);
        assert!(v.as_slice()[6..].iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_truncates_to_vector_length() {
        let mut pose = FramePose::new();
        for name in LandmarkName::ALL {
            pose.insert(name, Landmark::new(1.0, 1.0));
        }
        assert_eq!(encode(Some(&pose), 10).len(), 10);
        assert_eq!(encode(Some(&pose), 66).len(), 66);
    }

    #[test]
    fn test_angles_do_not_contribute() {
        let mut pose = FramePose::new().with_landmark(LandmarkName::Nose, Landmark::new(0.5, 0.5));
        let plain = encode(Some(&pose), 66);
        pose.set_angle(choreo_core::Joint::LeftElbow, 120.0);
        assert_eq!(encode(Some(&pose), 66), plain);
    }

    #[test]
    fn test_vector_metrics() {
        let a = FeatureVector::from_values(vec![0.0, 3.0, 1.0]);
        let b = FeatureVector::from_values(vec![4.0, 0.0, 1.0]);
        assert_eq!(a.dot(&b), 1.0);
        assert!((a.norm() - 10f64.sqrt()).abs() < 1e-12);
        assert!((a.euclidean(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.euclidean(&a), 0.0);
    }

    #[test]
    fn test_cosine_distance_of_zero_vector() {
        let zero = FeatureVector::zeros(4);
        let other = FeatureVector::from_values(vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(zero.cosine_distance(&other), 1.0);
        assert!(other.cosine_distance(&other).abs() < 1e-12);
    }
}
