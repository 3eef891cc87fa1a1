// Pose landmarker bridge
// Abstraction over the external pose-estimation model. The model itself is
// an opaque collaborator: it receives one image and returns zero or more
// detected poses at its own pace. Backends: Python MediaPipe through PyO3
// (feature "ml-pyo3"), or a null implementation so the crate builds and
// runs without an ML stack.

use crate::models::capture::CameraFrame;
use crate::models::pose::{DetectedPose, LandmarkerConfig, PoseResult};

/// Pose landmarker trait.
/// `detect` may block for the duration of model inference; callers that
/// must not stall run it on a blocking-friendly executor.
pub trait PoseLandmarker: Send + Sync {
    /// Initialize the landmarker
    fn new(config: &LandmarkerConfig) -> PoseResult<Self>
    where
        Self: Sized;

    /// Run inference on a frame. Zero poses is a valid result.
    fn detect(&self, frame: &CameraFrame) -> PoseResult<Vec<DetectedPose>>;

    /// Check if the model is loaded
    fn is_initialized(&self) -> bool;

    /// Get model info
    fn model_info(&self) -> String;
}

// ==============================================================================
// PyO3 Implementation (Python MediaPipe)
// ==============================================================================

#[cfg(feature = "ml-pyo3")]
pub mod pyo3_backend {
    use super::*;
    use crate::models::pose::{Landmark, PoseError};
    use pyo3::prelude::*;
    use pyo3::types::{PyBytes, PyDict};
    use serde_json::Value;

    pub struct PyO3Landmarker {
        inference_module: PyObject,
        config: LandmarkerConfig,
        initialized: bool,
    }

    impl PoseLandmarker for PyO3Landmarker {
        fn new(config: &LandmarkerConfig) -> PoseResult<Self> {
            config.validate()?;

            Python::with_gil(|py| {
                let sys = py
                    .import("sys")
                    .map_err(|e| PoseError::ModelLoadFailed(format!("Failed to import sys: {}", e)))?;

                let path_list = sys.getattr("path").map_err(|e| {
                    PoseError::ModelLoadFailed(format!("Failed to get sys.path: {}", e))
                })?;

                // Inference helper lives in the python directory next to the crate
                let python_dir = std::env::current_dir().unwrap_or_default().join("python");

                path_list
                    .call_method1("insert", (0, python_dir.to_str().unwrap()))
                    .map_err(|e| {
                        PoseError::ModelLoadFailed(format!(
                            "Failed to add python dir to path: {}",
                            e
                        ))
                    })?;

                let inference_module = py.import("pose_inference").map_err(|e| {
                    PoseError::ModelLoadFailed(format!(
                        "Failed to import pose_inference: {}. Make sure Python dependencies are installed (pip install -r requirements.txt)",
                        e
                    ))
                })?;

                println!(
                    "PyO3Landmarker initialized (model complexity: {:?})",
                    config.model_complexity
                );

                Ok(Self {
                    inference_module: inference_module.into(),
                    config: config.clone(),
                    initialized: true,
                })
            })
        }

        fn detect(&self, frame: &CameraFrame) -> PoseResult<Vec<DetectedPose>> {
            Python::with_gil(|py| {
                let module = self.inference_module.as_ref(py);

                let process_fn = module.getattr("process_image_bytes").map_err(|e| {
                    PoseError::InferenceFailed(format!("Failed to get process_image_bytes: {}", e))
                })?;

                let image_bytes = PyBytes::new(py, &frame.data);

                let kwargs = PyDict::new(py);
                kwargs
                    .set_item("image_bytes", image_bytes)
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to set image_bytes: {}", e)))?;
                kwargs
                    .set_item("width", frame.width)
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to set width: {}", e)))?;
                kwargs
                    .set_item("height", frame.height)
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to set height: {}", e)))?;
                kwargs
                    .set_item("timestamp_ms", frame.timestamp)
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to set timestamp_ms: {}", e)))?;
                kwargs
                    .set_item(
                        "min_detection_confidence",
                        self.config.min_detection_confidence,
                    )
                    .map_err(|e| {
                        PoseError::InferenceFailed(format!(
                            "Failed to set min_detection_confidence: {}",
                            e
                        ))
                    })?;
                kwargs
                    .set_item(
                        "min_tracking_confidence",
                        self.config.min_tracking_confidence,
                    )
                    .map_err(|e| {
                        PoseError::InferenceFailed(format!(
                            "Failed to set min_tracking_confidence: {}",
                            e
                        ))
                    })?;
                kwargs
                    .set_item("model_complexity", self.config.model_complexity as u8)
                    .map_err(|e| {
                        PoseError::InferenceFailed(format!("Failed to set model_complexity: {}", e))
                    })?;

                let result_json = process_fn
                    .call((), Some(kwargs))
                    .map_err(|e| PoseError::InferenceFailed(format!("Pose inference failed: {}", e)))?;

                let json_str: String = result_json
                    .extract()
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to extract JSON: {}", e)))?;

                let result: Value = serde_json::from_str(&json_str)
                    .map_err(|e| PoseError::InferenceFailed(format!("Failed to parse JSON: {}", e)))?;

                let poses = if let Some(poses_data) = result.get("poses") {
                    if let Some(poses_array) = poses_data.as_array() {
                        poses_array
                            .iter()
                            .filter_map(|pose| Self::parse_pose(pose).ok())
                            .collect()
                    } else {
                        vec![]
                    }
                } else {
                    vec![]
                };

                Ok(poses)
            })
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn model_info(&self) -> String {
            format!(
                "PyO3 MediaPipe Pose (Python backend) - complexity: {:?}",
                self.config.model_complexity
            )
        }
    }

    impl PyO3Landmarker {
        fn parse_pose(data: &Value) -> PoseResult<DetectedPose> {
            let keypoints = data
                .get("keypoints")
                .and_then(|k| k.as_array())
                .ok_or_else(|| PoseError::InferenceFailed("Missing pose keypoints".to_string()))?;

            let landmarks: Vec<Landmark> = keypoints
                .iter()
                .map(|kp| Landmark {
                    x: kp.get("x").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
                    y: kp.get("y").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
                    visibility: kp
                        .get("visibility")
                        .and_then(|v| v.as_f64())
                        .unwrap_or(0.0) as f32,
                })
                .collect();

            Ok(DetectedPose { landmarks })
        }
    }
}

// ==============================================================================
// Null Implementation (for builds without an ML backend)
// ==============================================================================

#[cfg(not(feature = "ml-pyo3"))]
pub struct NullLandmarker {
    config: LandmarkerConfig,
}

#[cfg(not(feature = "ml-pyo3"))]
impl PoseLandmarker for NullLandmarker {
    fn new(config: &LandmarkerConfig) -> PoseResult<Self> {
        config.validate()?;

        println!("Using null pose landmarker (no inference)");
        println!("Enable the 'ml-pyo3' feature for actual pose detection");

        Ok(Self {
            config: config.clone(),
        })
    }

    fn detect(&self, _frame: &CameraFrame) -> PoseResult<Vec<DetectedPose>> {
        Ok(vec![])
    }

    fn is_initialized(&self) -> bool {
        false
    }

    fn model_info(&self) -> String {
        format!(
            "Null pose landmarker (no ML inference - enable 'ml-pyo3'; configured complexity: {:?})",
            self.config.model_complexity
        )
    }
}

// ==============================================================================
// Default Backend Selection
// ==============================================================================

#[cfg(feature = "ml-pyo3")]
pub type DefaultLandmarker = pyo3_backend::PyO3Landmarker;

#[cfg(not(feature = "ml-pyo3"))]
pub type DefaultLandmarker = NullLandmarker;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capture::PixelFormat;

    #[cfg(not(feature = "ml-pyo3"))]
    #[test]
    fn test_default_landmarker_initializes_from_default_config() {
        let landmarker = DefaultLandmarker::new(&LandmarkerConfig::default())
            .expect("default config should initialize");
        assert!(!landmarker.model_info().is_empty());
    }

    #[cfg(not(feature = "ml-pyo3"))]
    #[test]
    fn test_null_landmarker_detects_nothing() {
        let landmarker = NullLandmarker::new(&LandmarkerConfig::default()).unwrap();
        let frame = CameraFrame {
            timestamp: 0,
            width: 4,
            height: 4,
            data: vec![0; 4 * 4 * 3],
            format: PixelFormat::RGB8,
        };

        let poses = landmarker.detect(&frame).expect("null detect never fails");
        assert!(poses.is_empty());
        assert!(!landmarker.is_initialized());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bad = LandmarkerConfig {
            min_tracking_confidence: -0.1,
            ..LandmarkerConfig::default()
        };
        assert!(DefaultLandmarker::new(&bad).is_err());
    }
}
