// Data models for body-pose estimation and detection results

use serde::{Deserialize, Serialize};

// ==============================================================================
// Landmarks
// ==============================================================================

/// A single body keypoint with a normalized screen-space position and a
/// visibility score. Origin is top-left, y increases downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,          // Normalized [0, 1]
    pub y: f32,          // Normalized [0, 1]
    pub visibility: f32, // Detection confidence [0, 1]
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }
}

/// Number of landmarks in one complete pose (MediaPipe Pose topology)
pub const LANDMARK_COUNT: usize = 33;

/// MediaPipe Pose landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BodyLandmark {
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

/// The landmarks the exercise tracker evaluates on every snapshot
pub const REQUIRED_FOR_TRACKING: [BodyLandmark; 4] = [
    BodyLandmark::LeftShoulder,
    BodyLandmark::RightShoulder,
    BodyLandmark::LeftWrist,
    BodyLandmark::RightWrist,
];

/// Skeleton connections relevant to a two-arm raise, for consumers that
/// render an overlay (pairs of landmark indices)
pub const ARM_CONNECTIONS: [(usize, usize); 5] = [
    (BodyLandmark::LeftShoulder as usize, BodyLandmark::LeftElbow as usize),
    (BodyLandmark::LeftElbow as usize, BodyLandmark::LeftWrist as usize),
    (BodyLandmark::RightShoulder as usize, BodyLandmark::RightElbow as usize),
    (BodyLandmark::RightElbow as usize, BodyLandmark::RightWrist as usize),
    (BodyLandmark::LeftShoulder as usize, BodyLandmark::RightShoulder as usize),
];

// ==============================================================================
// Detection Results
// ==============================================================================

/// One detected person, as returned by the pose landmarker. A detection
/// cycle may yield zero or more of these; single-person consumers use the
/// first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPose {
    pub landmarks: Vec<Landmark>,
}

/// One complete set of landmarks from one detection cycle, plus the capture
/// timestamp of the frame it was computed from. Immutable once constructed;
/// a snapshot is either fully present or absent, never partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseSnapshot {
    pub timestamp: i64,
    landmarks: Vec<Landmark>,
}

impl PoseSnapshot {
    /// Build a snapshot from a detected pose. Returns `None` when the
    /// detection does not carry the full landmark set.
    pub fn from_detection(pose: DetectedPose, timestamp: i64) -> Option<Self> {
        if pose.landmarks.len() < LANDMARK_COUNT {
            return None;
        }

        Some(Self {
            timestamp,
            landmarks: pose.landmarks,
        })
    }

    pub fn landmark(&self, which: BodyLandmark) -> Option<&Landmark> {
        self.landmarks.get(which as usize)
    }

    /// True when every listed landmark is present with at least the given
    /// visibility.
    pub fn has_landmarks(&self, required: &[BodyLandmark], min_visibility: f32) -> bool {
        required.iter().all(|&which| {
            self.landmark(which)
                .map(|lm| lm.is_visible(min_visibility))
                .unwrap_or(false)
        })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }
}

// ==============================================================================
// Configuration
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelComplexity {
    Lite = 0,  // Fastest, less accurate
    Full = 1,  // Balanced
    Heavy = 2, // Slowest, most accurate
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkerConfig {
    /// Minimum confidence for a detection to be reported (0.0-1.0)
    pub min_detection_confidence: f32,
    /// Minimum confidence to keep tracking between frames (0.0-1.0)
    pub min_tracking_confidence: f32,
    pub model_complexity: ModelComplexity,
}

impl Default for LandmarkerConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            model_complexity: ModelComplexity::Full,
        }
    }
}

impl LandmarkerConfig {
    pub fn validate(&self) -> PoseResult<()> {
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(PoseError::InvalidConfig(format!(
                "min_detection_confidence must be in [0, 1], got {}",
                self.min_detection_confidence
            )));
        }

        if !(0.0..=1.0).contains(&self.min_tracking_confidence) {
            return Err(PoseError::InvalidConfig(format!(
                "min_tracking_confidence must be in [0, 1], got {}",
                self.min_tracking_confidence
            )));
        }

        Ok(())
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum PoseError {
    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not supported in this build")]
    NotSupported,
}

pub type PoseResult<T> = Result<T, PoseError>;
