// Data models for the exercise tracker: published state and configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ==============================================================================
// Published State
// ==============================================================================

/// Read-only view of the tracker, published once per processed snapshot.
/// Observers only ever receive copies of this; the live tracking state is
/// never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    /// Completed repetitions. Non-decreasing; moves by at most 1 per
    /// processed pose snapshot, only on a raised-to-lowered transition.
    pub rep_count: u32,
    /// True while both limbs are currently up
    pub arms_raised: bool,
    /// True while sustained limb asymmetry is being flagged
    pub form_violation: bool,
    /// Average wrist height mapped into [0, 1] (0 = top of the calibrated
    /// band, 1 = bottom). `None` until the first fully-visible pose.
    pub wrist_elevation: Option<f32>,
    /// Capture timestamp of the last pose that updated the tracker
    pub last_pose_timestamp: Option<i64>,
}

impl TrackerSnapshot {
    pub fn target_reached(&self, target_reps: u32) -> bool {
        self.rep_count >= target_reps
    }
}

impl Default for TrackerSnapshot {
    fn default() -> Self {
        Self {
            rep_count: 0,
            arms_raised: false,
            form_violation: false,
            wrist_elevation: None,
            last_pose_timestamp: None,
        }
    }
}

// ==============================================================================
// Configuration
// ==============================================================================

/// When the form-violation flag is cleared again.
///
/// The two variants reproduce the two behaviors seen across iterations of
/// the exercise logic: clearing as soon as the limbs resync lets a corrected
/// rep count; latching until both limbs are down discards any rep that was
/// flagged at any point during its up-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    /// Clear whenever both limbs reach the same state (both up or both down)
    ClearOnMatch,
    /// Clear only when both limbs are lowered
    LatchUntilLowered,
}

impl ViolationPolicy {
    pub fn to_string(&self) -> &'static str {
        match self {
            ViolationPolicy::ClearOnMatch => "clear_on_match",
            ViolationPolicy::LatchUntilLowered => "latch_until_lowered",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "latch_until_lowered" => ViolationPolicy::LatchUntilLowered,
            _ => ViolationPolicy::ClearOnMatch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// How long exactly one limb may stay raised before the asymmetry is
    /// escalated to a form violation (milliseconds)
    pub asymmetry_tolerance_ms: u64,
    /// Minimum landmark visibility for a snapshot to be evaluated (0.0-1.0)
    pub visibility_threshold: f32,
    pub violation_policy: ViolationPolicy,
    /// Optional rep target configured at session start; progression past it
    /// is the embedding application's concern
    pub target_reps: Option<u32>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            asymmetry_tolerance_ms: 500,
            visibility_threshold: 0.5,
            violation_policy: ViolationPolicy::ClearOnMatch,
            target_reps: None,
        }
    }
}

impl TrackerConfig {
    pub fn tolerance(&self) -> Duration {
        Duration::from_millis(self.asymmetry_tolerance_ms)
    }
}
