// Real-time exercise repetition tracking from body-pose landmarks.
//
// A pose sampler bridges the camera and the external pose-estimation model
// to a lossy "latest snapshot" register; a tracking session feeds those
// snapshots through the rep/form state machine and publishes read-only
// counters for the application layer to poll.

pub mod core;
pub mod models;
pub mod platform;

pub use crate::core::config::Config;
pub use crate::core::pose_sampler::{PoseSampler, SamplerError};
pub use crate::core::rep_tracker::RepTracker;
pub use crate::core::session::TrackingSession;
pub use crate::models::pose::{BodyLandmark, Landmark, PoseSnapshot};
pub use crate::models::tracker::{TrackerConfig, TrackerSnapshot, ViolationPolicy};
pub use crate::platform::camera::CameraCapture;
pub use crate::platform::pose::{DefaultLandmarker, PoseLandmarker};
