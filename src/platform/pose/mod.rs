// Pose estimation platform integration
// Provides the landmarker bridge trait and backend selection

pub mod landmarker;

pub use landmarker::{DefaultLandmarker, PoseLandmarker};

#[cfg(not(feature = "ml-pyo3"))]
pub use landmarker::NullLandmarker;
