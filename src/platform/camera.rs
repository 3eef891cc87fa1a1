// Camera acquisition seam
// Real webcam backends live with the embedding application; this module
// defines the interface they implement plus a scripted in-memory source
// used by tests and camera-less shells.

use crate::models::capture::{
    CameraDevice, CameraFrame, CaptureError, CaptureResult,
};
use async_trait::async_trait;

/// Platform-agnostic camera capture trait
#[async_trait]
pub trait CameraCapture: Send + Sync {
    /// Get list of available camera devices
    async fn list_devices(&self) -> CaptureResult<Vec<CameraDevice>>;

    /// Open the specified device for capture
    async fn open(&mut self, device_id: u32) -> CaptureResult<()>;

    /// Acquire the next frame from the open device
    async fn read_frame(&mut self) -> CaptureResult<CameraFrame>;

    /// Release the device
    async fn close(&mut self) -> CaptureResult<()>;

    /// Check if a device is currently open
    fn is_open(&self) -> bool;

    /// Get the currently open device
    fn current_device_id(&self) -> Option<u32>;
}

// ==============================================================================
// Synthetic Camera
// ==============================================================================

/// Replays a prepared sequence of frames. With `looping` the script repeats
/// forever; otherwise exhaustion surfaces as `Disconnected`, which is how a
/// real camera going away mid-session presents.
pub struct SyntheticCamera {
    frames: Vec<CameraFrame>,
    looping: bool,
    position: usize,
    device_id: Option<u32>,
    last_timestamp: i64,
}

impl SyntheticCamera {
    pub fn new(frames: Vec<CameraFrame>, looping: bool) -> Self {
        Self {
            frames,
            looping,
            position: 0,
            device_id: None,
            last_timestamp: 0,
        }
    }
}

#[async_trait]
impl CameraCapture for SyntheticCamera {
    async fn list_devices(&self) -> CaptureResult<Vec<CameraDevice>> {
        Ok(vec![CameraDevice {
            id: 0,
            name: "Synthetic camera".to_string(),
            is_default: true,
        }])
    }

    async fn open(&mut self, device_id: u32) -> CaptureResult<()> {
        if self.device_id.is_some() {
            return Err(CaptureError::AlreadyOpen);
        }

        if device_id != 0 {
            return Err(CaptureError::DeviceNotFound(device_id));
        }

        self.device_id = Some(device_id);
        self.position = 0;
        Ok(())
    }

    async fn read_frame(&mut self) -> CaptureResult<CameraFrame> {
        if self.device_id.is_none() {
            return Err(CaptureError::NotOpen);
        }

        if self.position >= self.frames.len() {
            if self.looping && !self.frames.is_empty() {
                self.position = 0;
            } else {
                return Err(CaptureError::Disconnected(
                    "frame script exhausted".to_string(),
                ));
            }
        }

        let mut frame = self.frames[self.position].clone();
        self.position += 1;

        // Downstream detectors require strictly increasing capture timestamps
        let mut timestamp = chrono::Utc::now().timestamp_millis();
        if timestamp <= self.last_timestamp {
            timestamp = self.last_timestamp + 1;
        }
        self.last_timestamp = timestamp;
        frame.timestamp = timestamp;

        Ok(frame)
    }

    async fn close(&mut self) -> CaptureResult<()> {
        if self.device_id.is_none() {
            return Err(CaptureError::NotOpen);
        }

        self.device_id = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.device_id.is_some()
    }

    fn current_device_id(&self) -> Option<u32> {
        self.device_id
    }
}
