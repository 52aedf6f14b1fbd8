//! Fundamental types for the choreography comparison system.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The 33 named body landmarks produced by the pose-estimation model
/// (MediaPipe Pose topology, in model index order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LandmarkName {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkName {
    pub const COUNT: usize = 33;

    pub const ALL: [LandmarkName; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    /// Wire name used in pose files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }

    /// Body segment this landmark belongs to
    pub fn segment(&self) -> BodySegment {
        match self {
            Self::Nose
            | Self::LeftEyeInner
            | Self::LeftEye
            | Self::LeftEyeOuter
            | Self::RightEyeInner
            | Self::RightEye
            | Self::RightEyeOuter
            | Self::LeftEar
            | Self::RightEar
            | Self::MouthLeft
            | Self::MouthRight => BodySegment::Face,
            Self::LeftShoulder | Self::RightShoulder => BodySegment::Shoulder,
            Self::LeftElbow | Self::RightElbow => BodySegment::Elbow,
            Self::LeftWrist | Self::RightWrist => BodySegment::Wrist,
            Self::LeftPinky
            | Self::RightPinky
            | Self::LeftIndex
            | Self::RightIndex
            | Self::LeftThumb
            | Self::RightThumb => BodySegment::Hand,
            Self::LeftHip | Self::RightHip => BodySegment::Hip,
            Self::LeftKnee | Self::RightKnee => BodySegment::Knee,
            Self::LeftAnkle | Self::RightAnkle => BodySegment::Ankle,
            Self::LeftHeel | Self::RightHeel | Self::LeftFootIndex | Self::RightFootIndex => {
                BodySegment::Foot
            }
        }
    }
}

impl fmt::Display for LandmarkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LandmarkName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown landmark: {s}")))
    }
}

/// Coarse anatomical grouping used by focus-area filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySegment {
    Face,
    Shoulder,
    Elbow,
    Wrist,
    Hand,
    Hip,
    Knee,
    Ankle,
    Foot,
}

/// Named subset of tracked landmarks that narrows comparison scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    FullBody,
    UpperBody,
    LowerBody,
    Arms,
    Legs,
}

impl FocusArea {
    pub fn segments(&self) -> &'static [BodySegment] {
        use BodySegment::*;
        match self {
            FocusArea::FullBody => &[Face, Shoulder, Elbow, Wrist, Hand, Hip, Knee, Ankle, Foot],
            FocusArea::UpperBody => &[Face, Shoulder, Elbow, Wrist],
            FocusArea::Arms => &[Shoulder, Elbow, Wrist, Hand],
            FocusArea::LowerBody | FocusArea::Legs => &[Hip, Knee, Ankle, Foot],
        }
    }

    pub fn includes(&self, landmark: LandmarkName) -> bool {
        self.segments().contains(&landmark.segment())
    }

    /// Whether a landmark survives a list of focus areas.
    /// An empty list, or one naming `full_body`, keeps everything.
    pub fn admits(areas: &[FocusArea], landmark: LandmarkName) -> bool {
        areas.is_empty()
            || areas.contains(&FocusArea::FullBody)
            || areas.iter().any(|area| area.includes(landmark))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FocusArea::FullBody => "full_body",
            FocusArea::UpperBody => "upper_body",
            FocusArea::LowerBody => "lower_body",
            FocusArea::Arms => "arms",
            FocusArea::Legs => "legs",
        }
    }

    /// Parse a comma-separated list such as `"arms, legs"`
    pub fn parse_list(list: &str) -> Result<Vec<FocusArea>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FocusArea::from_str)
            .collect()
    }
}

impl FromStr for FocusArea {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full_body" => Ok(FocusArea::FullBody),
            "upper_body" => Ok(FocusArea::UpperBody),
            "lower_body" => Ok(FocusArea::LowerBody),
            "arms" => Ok(FocusArea::Arms),
            "legs" => Ok(FocusArea::Legs),
            other => Err(Error::InvalidInput(format!("unknown focus area: {other}"))),
        }
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single detected landmark in normalized image-plane coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Detection confidence [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    pub fn with_depth(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn distance_2d(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Joints with a derived flexion angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftElbow,
    RightElbow,
    LeftKnee,
    RightKnee,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
}

impl Joint {
    pub const ALL: [Joint; 8] = [
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftHip,
        Joint::RightHip,
    ];

    /// The three landmarks spanning the joint; the angle is measured at the middle one.
    pub fn landmarks(&self) -> [LandmarkName; 3] {
        use LandmarkName::*;
        match self {
            Joint::LeftElbow => [LeftShoulder, LeftElbow, LeftWrist],
            Joint::RightElbow => [RightShoulder, RightElbow, RightWrist],
            Joint::LeftKnee => [LeftHip, LeftKnee, LeftAnkle],
            Joint::RightKnee => [RightHip, RightKnee, RightAnkle],
            Joint::LeftShoulder => [LeftElbow, LeftShoulder, LeftHip],
            Joint::RightShoulder => [RightElbow, RightShoulder, RightHip],
            Joint::LeftHip => [LeftShoulder, LeftHip, LeftKnee],
            Joint::RightHip => [RightShoulder, RightHip, RightKnee],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
        }
    }
}

impl FromStr for Joint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|joint| joint.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown joint: {s}")))
    }
}

/// All landmarks detected in one video frame, plus derived joint angles (degrees)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFramePose", into = "RawFramePose")]
pub struct FramePose {
    landmarks: BTreeMap<LandmarkName, Landmark>,
    angles: BTreeMap<Joint, f64>,
}

impl FramePose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_landmark(mut self, name: LandmarkName, landmark: Landmark) -> Self {
        self.landmarks.insert(name, landmark);
        self
    }

    pub fn insert(&mut self, name: LandmarkName, landmark: Landmark) {
        self.landmarks.insert(name, landmark);
    }

    pub fn get(&self, name: LandmarkName) -> Option<&Landmark> {
        self.landmarks.get(&name)
    }

    pub fn contains(&self, name: LandmarkName) -> bool {
        self.landmarks.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn landmarks(&self) -> impl Iterator<Item = (LandmarkName, &Landmark)> {
        self.landmarks.iter().map(|(name, lm)| (*name, lm))
    }

    pub fn angles(&self) -> &BTreeMap<Joint, f64> {
        &self.angles
    }

    pub fn set_angle(&mut self, joint: Joint, degrees: f64) {
        self.angles.insert(joint, degrees);
    }

    /// Replace the angle map with angles computed from the current landmarks
    pub fn with_computed_angles(mut self) -> Self {
        self.angles = crate::geometry::joint_angles(&self);
        self
    }

    /// Angles carried by the frame, or computed on demand when none were supplied
    pub fn angles_or_computed(&self) -> BTreeMap<Joint, f64> {
        if self.angles.is_empty() {
            crate::geometry::joint_angles(self)
        } else {
            self.angles.clone()
        }
    }

    /// Keep only landmarks admitted by the focus areas. Angles whose joint
    /// lost a landmark are dropped.
    pub fn filtered(&self, areas: &[FocusArea]) -> FramePose {
        let landmarks: BTreeMap<_, _> = self
            .landmarks
            .iter()
            .filter(|(name, _)| FocusArea::admits(areas, **name))
            .map(|(name, lm)| (*name, *lm))
            .collect();

        let angles = self
            .angles
            .iter()
            .filter(|(joint, _)| joint.landmarks().iter().all(|n| landmarks.contains_key(n)))
            .map(|(joint, deg)| (*joint, *deg))
            .collect();

        FramePose { landmarks, angles }
    }
}

/// Wire form of a frame: landmark names as top-level keys next to `angles`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFramePose {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    angles: BTreeMap<String, Option<f64>>,
    #[serde(flatten)]
    landmarks: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawFramePose> for FramePose {
    type Error = Error;

    fn try_from(raw: RawFramePose) -> Result<Self> {
        let mut landmarks = BTreeMap::new();
        for (key, value) in raw.landmarks {
            // Keys outside the vocabulary are ignored.
            let Ok(name) = key.parse::<LandmarkName>() else {
                continue;
            };
            let landmark: Landmark = serde_json::from_value(value)?;
            landmarks.insert(name, landmark);
        }

        let angles = raw
            .angles
            .into_iter()
            .filter_map(|(key, deg)| Some((key.parse::<Joint>().ok()?, deg?)))
            .collect();

        Ok(FramePose { landmarks, angles })
    }
}

impl From<FramePose> for RawFramePose {
    fn from(pose: FramePose) -> Self {
        let landmarks = pose
            .landmarks
            .into_iter()
            .filter_map(|(name, lm)| {
                Some((name.as_str().to_string(), serde_json::to_value(lm).ok()?))
            })
            .collect();
        let angles = pose
            .angles
            .into_iter()
            .map(|(joint, deg)| (joint.as_str().to_string(), Some(deg)))
            .collect();
        RawFramePose { angles, landmarks }
    }
}

fn default_focus_areas() -> Vec<FocusArea> {
    vec![FocusArea::FullBody]
}

/// Ordered per-frame poses of one performance with parallel metadata.
/// `None` marks a frame where detection failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSequence {
    pub poses: Vec<Option<FramePose>>,
    #[serde(default)]
    pub frame_numbers: Vec<usize>,
    /// Seconds, monotonically increasing
    #[serde(default)]
    pub timestamps: Vec<f64>,
    pub fps: f64,
    #[serde(default)]
    pub total_frames: usize,
    #[serde(default)]
    pub duration: f64,
    #[serde(default = "default_focus_areas")]
    pub focus_areas: Vec<FocusArea>,
}

impl PoseSequence {
    /// Build a sequence sampled at `fps`, deriving timestamps and duration
    pub fn from_frames(poses: Vec<Option<FramePose>>, fps: f64) -> Self {
        let total_frames = poses.len();
        let timestamps = (0..total_frames)
            .map(|i| if fps > 0.0 { i as f64 / fps } else { 0.0 })
            .collect();
        let duration = if fps > 0.0 {
            total_frames as f64 / fps
        } else {
            0.0
        };

        Self {
            poses,
            frame_numbers: (0..total_frames).collect(),
            timestamps,
            fps,
            total_frames,
            duration,
            focus_areas: default_focus_areas(),
        }
    }

    pub fn with_focus_areas(mut self, focus_areas: Vec<FocusArea>) -> Self {
        self.focus_areas = focus_areas;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn detected_count(&self) -> usize {
        self.poses.iter().filter(|p| p.is_some()).count()
    }

    /// Timestamp of frame `idx`; falls back to `idx / fps`, then 0
    pub fn timestamp_at(&self, idx: usize) -> f64 {
        match self.timestamps.get(idx) {
            Some(t) => *t,
            None if self.fps > 0.0 => idx as f64 / self.fps,
            None => 0.0,
        }
    }

    /// Detected frames in order, paired with their timestamps
    pub fn detected_frames(&self) -> impl Iterator<Item = (f64, &FramePose)> {
        self.poses
            .iter()
            .enumerate()
            .filter_map(|(i, pose)| pose.as_ref().map(|p| (self.timestamp_at(i), p)))
    }
}
