// Data structures for camera frame acquisition

use serde::{Deserialize, Serialize};

/// Represents a camera device that can be opened for capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraDevice {
    pub id: u32,
    pub name: String,
    pub is_default: bool,
}

/// A single frame acquired from a camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub timestamp: i64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

/// Pixel format of acquired frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGB8,
    RGBA8,
    BGR8,
}

/// Error types for camera operations. `Clone` so a terminal failure can be
/// retained for the owner after it has been logged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    #[error("Camera device not found: {0}")]
    DeviceNotFound(u32),

    #[error("Failed to open camera: {0}")]
    OpenFailed(String),

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("Camera disconnected: {0}")]
    Disconnected(String),

    #[error("Camera already open")]
    AlreadyOpen,

    #[error("Camera not open")]
    NotOpen,

    #[error("Not supported on this platform")]
    NotSupported,
}

pub type CaptureResult<T> = Result<T, CaptureError>;
