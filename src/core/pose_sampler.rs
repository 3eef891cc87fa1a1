// Pose sampler - bridges the push-style camera/detector pipeline to a
// pull-style "latest snapshot" query

use crate::models::capture::CaptureError;
use crate::models::pose::{PoseError, PoseSnapshot};
use crate::platform::camera::CameraCapture;
use crate::platform::pose::PoseLandmarker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("Camera error: {0}")]
    Camera(#[from] CaptureError),

    #[error("Detector error: {0}")]
    Detector(#[from] PoseError),

    #[error("Sampler already running")]
    AlreadyRunning,
}

/// Drives camera acquisition and pose detection in the background and
/// exposes the most recent completed detection to any number of readers.
///
/// The handoff is a single-slot register: one writer (the detection
/// completion), overwrite-on-write, last-write-wins, no queueing.
/// Intermediate results may be skipped by consumers; only the newest one is
/// ever retained. Slot contents are immutable once constructed, so readers
/// never observe a partially-written snapshot.
pub struct PoseSampler {
    camera: Arc<Mutex<Box<dyn CameraCapture>>>,
    landmarker: Arc<dyn PoseLandmarker>,
    latest: Arc<RwLock<Option<Arc<PoseSnapshot>>>>,
    in_flight: Arc<AtomicBool>,
    is_running: Arc<RwLock<bool>>,
    last_error: Arc<RwLock<Option<CaptureError>>>,
    frame_interval: Duration,
}

impl PoseSampler {
    pub fn new(
        camera: Box<dyn CameraCapture>,
        landmarker: Arc<dyn PoseLandmarker>,
        frame_interval: Duration,
    ) -> Self {
        Self {
            camera: Arc::new(Mutex::new(camera)),
            landmarker,
            latest: Arc::new(RwLock::new(None)),
            in_flight: Arc::new(AtomicBool::new(false)),
            is_running: Arc::new(RwLock::new(false)),
            last_error: Arc::new(RwLock::new(None)),
            frame_interval,
        }
    }

    /// Open the camera and start the acquisition loop.
    ///
    /// A camera that cannot be opened is fatal here: the session cannot
    /// proceed without a pose source, so the error propagates instead of
    /// being retried.
    pub async fn start(&self, device_id: u32) -> Result<(), SamplerError> {
        let mut is_running = self.is_running.write().await;
        if *is_running {
            return Err(SamplerError::AlreadyRunning);
        }

        self.camera.lock().await.open(device_id).await?;

        *self.last_error.write().await = None;
        *is_running = true;

        let camera = self.camera.clone();
        let landmarker = self.landmarker.clone();
        let latest = self.latest.clone();
        let in_flight = self.in_flight.clone();
        let is_running_flag = self.is_running.clone();
        let last_error = self.last_error.clone();
        let frame_interval = self.frame_interval;

        tokio::spawn(async move {
            Self::acquisition_loop(
                camera,
                landmarker,
                latest,
                in_flight,
                is_running_flag,
                last_error,
                frame_interval,
            )
            .await;
        });

        println!("Pose sampler started on camera device {}", device_id);
        Ok(())
    }

    /// Camera-paced acquisition, independent of any consumer's polling rate
    async fn acquisition_loop(
        camera: Arc<Mutex<Box<dyn CameraCapture>>>,
        landmarker: Arc<dyn PoseLandmarker>,
        latest: Arc<RwLock<Option<Arc<PoseSnapshot>>>>,
        in_flight: Arc<AtomicBool>,
        is_running: Arc<RwLock<bool>>,
        last_error: Arc<RwLock<Option<CaptureError>>>,
        frame_interval: Duration,
    ) {
        loop {
            if !*is_running.read().await {
                break;
            }

            let frame = camera.lock().await.read_frame().await;

            match frame {
                Ok(frame) => {
                    // At most one detection in flight; a busy detector
                    // drops the frame rather than building a backlog
                    if !in_flight.swap(true, Ordering::AcqRel) {
                        let landmarker = landmarker.clone();
                        let latest = latest.clone();
                        let in_flight = in_flight.clone();

                        tokio::spawn(async move {
                            let timestamp = frame.timestamp;
                            let result = tokio::task::spawn_blocking(move || {
                                landmarker.detect(&frame)
                            })
                            .await;

                            match result {
                                Ok(Ok(poses)) => {
                                    // Single-person contract: the first
                                    // detected pose wins. An empty or
                                    // incomplete detection publishes
                                    // nothing; the previous snapshot stays
                                    // current.
                                    if let Some(snapshot) = poses
                                        .into_iter()
                                        .next()
                                        .and_then(|pose| {
                                            PoseSnapshot::from_detection(pose, timestamp)
                                        })
                                    {
                                        *latest.write().await = Some(Arc::new(snapshot));
                                    }
                                }
                                Ok(Err(e)) => {
                                    eprintln!("Pose inference failed: {}", e);
                                }
                                Err(e) => {
                                    eprintln!("Pose inference task failed: {}", e);
                                }
                            }

                            in_flight.store(false, Ordering::Release);
                        });
                    }
                }
                Err(e) => {
                    // Losing the camera is terminal for the sampler
                    eprintln!("Camera capture failed: {}", e);
                    *last_error.write().await = Some(e);
                    *is_running.write().await = false;
                    break;
                }
            }

            tokio::time::sleep(frame_interval).await;
        }

        // Release the camera on the way out
        let _ = camera.lock().await.close().await;
        println!("Pose sampler stopped");
    }

    /// The most recently completed detection, or `None` if no detection has
    /// completed yet. Never waits on an in-flight detection.
    pub async fn latest(&self) -> Option<Arc<PoseSnapshot>> {
        self.latest.read().await.clone()
    }

    /// Stop the acquisition loop; the loop releases the camera on exit
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// The terminal camera error that stopped the sampler, if any
    pub async fn last_error(&self) -> Option<CaptureError> {
        self.last_error.read().await.clone()
    }

    pub fn model_info(&self) -> String {
        self.landmarker.model_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capture::{CameraFrame, PixelFormat};
    use crate::models::pose::{DetectedPose, Landmark, LandmarkerConfig, PoseResult, LANDMARK_COUNT};
    use crate::platform::camera::SyntheticCamera;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex as StdMutex;

    const FRAME_INTERVAL: Duration = Duration::from_millis(5);

    fn test_frame() -> CameraFrame {
        CameraFrame {
            timestamp: 0,
            width: 4,
            height: 4,
            data: vec![0; 4 * 4 * 3],
            format: PixelFormat::RGB8,
        }
    }

    fn looping_camera() -> Box<dyn CameraCapture> {
        Box::new(SyntheticCamera::new(vec![test_frame()], true))
    }

    fn full_pose(y: f32) -> DetectedPose {
        DetectedPose {
            landmarks: vec![Landmark::new(0.5, y, 1.0); LANDMARK_COUNT],
        }
    }

    /// Returns scripted results in order, then empty detections forever
    struct ScriptedLandmarker {
        script: StdMutex<VecDeque<PoseResult<Vec<DetectedPose>>>>,
    }

    impl ScriptedLandmarker {
        fn with_script(script: Vec<PoseResult<Vec<DetectedPose>>>) -> Self {
            Self {
                script: StdMutex::new(script.into()),
            }
        }
    }

    impl PoseLandmarker for ScriptedLandmarker {
        fn new(_config: &LandmarkerConfig) -> PoseResult<Self> {
            Ok(Self::with_script(vec![]))
        }

        fn detect(&self, _frame: &CameraFrame) -> PoseResult<Vec<DetectedPose>> {
            match self.script.lock().unwrap().pop_front() {
                Some(result) => result,
                None => Ok(vec![]),
            }
        }

        fn is_initialized(&self) -> bool {
            true
        }

        fn model_info(&self) -> String {
            "Scripted landmarker".to_string()
        }
    }

    /// Every detection yields a fresh pose whose 33 landmarks all share one
    /// y value, so a torn read would be visible as a mixed set
    struct CountingLandmarker {
        calls: AtomicU32,
    }

    impl PoseLandmarker for CountingLandmarker {
        fn new(_config: &LandmarkerConfig) -> PoseResult<Self> {
            Ok(Self {
                calls: AtomicU32::new(0),
            })
        }

        fn detect(&self, _frame: &CameraFrame) -> PoseResult<Vec<DetectedPose>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let y = (call % 100) as f32 / 100.0;
            Ok(vec![full_pose(y)])
        }

        fn is_initialized(&self) -> bool {
            true
        }

        fn model_info(&self) -> String {
            "Counting landmarker".to_string()
        }
    }

    async fn wait_for_snapshot(sampler: &PoseSampler) -> Option<Arc<PoseSnapshot>> {
        for _ in 0..100 {
            if let Some(snapshot) = sampler.latest().await {
                return Some(snapshot);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        None
    }

    #[tokio::test]
    async fn test_latest_is_none_before_first_detection() {
        let sampler = PoseSampler::new(
            looping_camera(),
            Arc::new(ScriptedLandmarker::with_script(vec![])),
            FRAME_INTERVAL,
        );

        assert!(sampler.latest().await.is_none());

        // Empty detections never publish a snapshot
        sampler.start(0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sampler.latest().await.is_none());

        sampler.stop().await;
    }

    #[tokio::test]
    async fn test_completed_detection_is_published() {
        let sampler = PoseSampler::new(
            looping_camera(),
            Arc::new(CountingLandmarker::new(&LandmarkerConfig::default()).unwrap()),
            FRAME_INTERVAL,
        );

        sampler.start(0).await.unwrap();

        let snapshot = wait_for_snapshot(&sampler)
            .await
            .expect("a detection should complete and publish");
        assert_eq!(snapshot.landmarks().len(), LANDMARK_COUNT);
        assert!(snapshot.timestamp > 0);

        sampler.stop().await;
    }

    #[tokio::test]
    async fn test_latest_overwrites_with_newest() {
        let sampler = PoseSampler::new(
            looping_camera(),
            Arc::new(CountingLandmarker::new(&LandmarkerConfig::default()).unwrap()),
            FRAME_INTERVAL,
        );

        sampler.start(0).await.unwrap();

        let first = wait_for_snapshot(&sampler).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = sampler.latest().await.unwrap();

        assert!(
            second.timestamp >= first.timestamp,
            "the slot only ever moves forward in time"
        );

        sampler.stop().await;
    }

    #[tokio::test]
    async fn test_detector_error_keeps_previous_snapshot() {
        let script = vec![
            Ok(vec![full_pose(0.25)]),
            Err(PoseError::InferenceFailed("transient".to_string())),
        ];
        let sampler = PoseSampler::new(
            looping_camera(),
            Arc::new(ScriptedLandmarker::with_script(script)),
            FRAME_INTERVAL,
        );

        sampler.start(0).await.unwrap();

        let snapshot = wait_for_snapshot(&sampler).await.unwrap();
        let y = snapshot.landmarks()[0].y;
        assert_eq!(y, 0.25);

        // The failed detection and the later empty ones leave the slot as-is,
        // and the sampler keeps running
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after = sampler.latest().await.unwrap();
        assert_eq!(after.landmarks()[0].y, 0.25);
        assert!(sampler.is_running().await);

        sampler.stop().await;
    }

    #[tokio::test]
    async fn test_camera_loss_is_terminal() {
        // Two frames, no looping: the third read disconnects
        let camera = Box::new(SyntheticCamera::new(vec![test_frame(), test_frame()], false));
        let sampler = PoseSampler::new(
            camera,
            Arc::new(CountingLandmarker::new(&LandmarkerConfig::default()).unwrap()),
            FRAME_INTERVAL,
        );

        sampler.start(0).await.unwrap();

        for _ in 0..100 {
            if !sampler.is_running().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(!sampler.is_running().await, "camera loss must stop the sampler");
        assert!(matches!(
            sampler.last_error().await,
            Some(CaptureError::Disconnected(_))
        ));
    }

    #[tokio::test]
    async fn test_startup_failure_propagates() {
        let sampler = PoseSampler::new(
            looping_camera(),
            Arc::new(ScriptedLandmarker::with_script(vec![])),
            FRAME_INTERVAL,
        );

        // The synthetic camera only exposes device 0
        let result = sampler.start(9).await;
        assert!(matches!(
            result,
            Err(SamplerError::Camera(CaptureError::DeviceNotFound(9)))
        ));
        assert!(!sampler.is_running().await);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let sampler = PoseSampler::new(
            looping_camera(),
            Arc::new(ScriptedLandmarker::with_script(vec![])),
            FRAME_INTERVAL,
        );

        sampler.start(0).await.unwrap();
        assert!(matches!(
            sampler.start(0).await,
            Err(SamplerError::AlreadyRunning)
        ));

        sampler.stop().await;
    }

    #[tokio::test]
    async fn test_concurrent_reads_never_see_torn_snapshots() {
        let sampler = Arc::new(PoseSampler::new(
            looping_camera(),
            Arc::new(CountingLandmarker::new(&LandmarkerConfig::default()).unwrap()),
            Duration::from_millis(1),
        ));

        sampler.start(0).await.unwrap();
        wait_for_snapshot(&sampler).await.expect("need at least one snapshot");

        let mut readers = Vec::new();
        for _ in 0..4 {
            let sampler = sampler.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..200 {
                    if let Some(snapshot) = sampler.latest().await {
                        let first_y = snapshot.landmarks()[0].y;
                        assert!(
                            snapshot.landmarks().iter().all(|lm| lm.y == first_y),
                            "every snapshot must be internally consistent"
                        );
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }

        for reader in readers {
            reader.await.expect("reader task must not panic");
        }

        sampler.stop().await;
    }
}
