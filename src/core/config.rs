use crate::models::pose::LandmarkerConfig;
use crate::models::tracker::TrackerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Camera device to open at session start
    pub camera_device_id: u32,
    /// Camera acquisition rate (frames per second)
    pub camera_fps: u32,
    /// Tracker evaluation rate (polls per second)
    pub evaluation_fps: u32,
    pub tracker: TrackerConfig,
    pub landmarker: LandmarkerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_device_id: 0,
            camera_fps: 30,
            evaluation_fps: 30,
            tracker: TrackerConfig::default(),
            landmarker: LandmarkerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating with defaults if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            // Create default config and save it
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.validate()?;

        let config_path = Self::get_config_path()?;

        // Create parent directories if they don't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Serialize and write to file with pretty formatting
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.camera_fps == 0 || self.camera_fps > 60 {
            return Err(format!(
                "Invalid camera FPS: {}. Must be between 1 and 60",
                self.camera_fps
            )
            .into());
        }

        if self.evaluation_fps == 0 || self.evaluation_fps > 60 {
            return Err(format!(
                "Invalid evaluation FPS: {}. Must be between 1 and 60",
                self.evaluation_fps
            )
            .into());
        }

        if self.tracker.asymmetry_tolerance_ms == 0 || self.tracker.asymmetry_tolerance_ms > 60_000
        {
            return Err(format!(
                "Invalid asymmetry tolerance: {} ms. Must be between 1 and 60000",
                self.tracker.asymmetry_tolerance_ms
            )
            .into());
        }

        if !(0.0..=1.0).contains(&self.tracker.visibility_threshold) {
            return Err(format!(
                "Invalid visibility threshold: {}. Must be between 0.0 and 1.0",
                self.tracker.visibility_threshold
            )
            .into());
        }

        if let Some(target) = self.tracker.target_reps {
            if target == 0 {
                return Err("Rep target must be at least 1 when set".into());
            }
        }

        self.landmarker.validate()?;

        Ok(())
    }

    /// Reset to default configuration
    pub fn reset() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::default();
        config.save()?;
        Ok(config)
    }

    /// Camera acquisition period
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.camera_fps as f64)
    }

    /// Tracker evaluation period
    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.evaluation_fps as f64)
    }

    /// Get the configuration file path
    fn get_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| "Could not determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(".reptrack");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tracker::ViolationPolicy;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.camera_device_id, 0);
        assert_eq!(config.camera_fps, 30);
        assert_eq!(config.evaluation_fps, 30);
        assert_eq!(config.tracker.asymmetry_tolerance_ms, 500);
        assert_eq!(config.tracker.visibility_threshold, 0.5);
        assert_eq!(config.tracker.violation_policy, ViolationPolicy::ClearOnMatch);
        assert_eq!(config.landmarker.min_detection_confidence, 0.5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Invalid camera FPS
        config.camera_fps = 0;
        assert!(config.validate().is_err());
        config.camera_fps = 100;
        assert!(config.validate().is_err());
        config.camera_fps = 30;

        // Invalid evaluation FPS
        config.evaluation_fps = 0;
        assert!(config.validate().is_err());
        config.evaluation_fps = 30;

        // Invalid tolerance
        config.tracker.asymmetry_tolerance_ms = 0;
        assert!(config.validate().is_err());
        config.tracker.asymmetry_tolerance_ms = 120_000;
        assert!(config.validate().is_err());
        config.tracker.asymmetry_tolerance_ms = 500;

        // Invalid visibility threshold
        config.tracker.visibility_threshold = 1.5;
        assert!(config.validate().is_err());
        config.tracker.visibility_threshold = 0.5;

        // Invalid rep target
        config.tracker.target_reps = Some(0);
        assert!(config.validate().is_err());
        config.tracker.target_reps = Some(10);
        assert!(config.validate().is_ok());

        // Invalid landmarker confidence
        config.landmarker.min_detection_confidence = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_intervals_follow_rates() {
        let config = Config {
            camera_fps: 20,
            evaluation_fps: 10,
            ..Config::default()
        };

        assert_eq!(config.frame_interval(), Duration::from_millis(50));
        assert_eq!(config.evaluation_interval(), Duration::from_millis(100));
    }
}
