// Exercise repetition tracking - state machine over incoming pose snapshots

use crate::models::pose::{BodyLandmark, PoseSnapshot, REQUIRED_FOR_TRACKING};
use crate::models::tracker::{TrackerConfig, TrackerSnapshot, ViolationPolicy};
use std::time::Instant;

// Normalized wrist-height band mapped onto [0, 1] for consumers that
// animate against the elevation value
const WRIST_BAND_TOP: f32 = 0.2;
const WRIST_BAND_BOTTOM: f32 = 0.8;

/// Tracks repetitions and form for a two-limb symmetric raise.
///
/// Owns the only mutable tracking state in the system. All mutation goes
/// through `process_snapshot`; everyone else sees the state through the
/// immutable copies returned by `snapshot`.
pub struct RepTracker {
    config: TrackerConfig,
    rep_count: u32,
    arms_raised: bool,
    form_violation: bool,
    asymmetry_since: Option<Instant>,
    wrist_elevation: Option<f32>,
    last_pose_timestamp: Option<i64>,
}

impl RepTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            rep_count: 0,
            arms_raised: false,
            form_violation: false,
            asymmetry_since: None,
            wrist_elevation: None,
            last_pose_timestamp: None,
        }
    }

    /// Evaluate one pose snapshot at time `now`.
    ///
    /// Safe to call repeatedly with the same (snapshot, now) pair: the
    /// second and later calls change nothing. A rep is counted only on the
    /// raised-to-lowered transition, and only when no form violation is in
    /// effect at that moment.
    pub fn process_snapshot(&mut self, snapshot: &PoseSnapshot, now: Instant) {
        // Partial or low-confidence data carries no new information; every
        // field, including the asymmetry timer, holds its previous value
        if !snapshot.has_landmarks(&REQUIRED_FOR_TRACKING, self.config.visibility_threshold) {
            return;
        }

        let (left_shoulder, right_shoulder, left_wrist, right_wrist) = match (
            snapshot.landmark(BodyLandmark::LeftShoulder),
            snapshot.landmark(BodyLandmark::RightShoulder),
            snapshot.landmark(BodyLandmark::LeftWrist),
            snapshot.landmark(BodyLandmark::RightWrist),
        ) {
            (Some(ls), Some(rs), Some(lw), Some(rw)) => (ls, rs, lw, rw),
            _ => return,
        };

        // Raised = wrist above its own shoulder in screen space (y grows
        // downward)
        let left_raised = left_wrist.y < left_shoulder.y;
        let right_raised = right_wrist.y < right_shoulder.y;
        let both_raised = left_raised && right_raised;
        let both_lowered = !left_raised && !right_raised;

        // Asymmetry debounce: exactly one limb up starts the timer;
        // outlasting the tolerance escalates to a violation
        if left_raised != right_raised {
            match self.asymmetry_since {
                None => self.asymmetry_since = Some(now),
                Some(since) => {
                    if now.duration_since(since) > self.config.tolerance() {
                        self.form_violation = true;
                    }
                }
            }
        } else {
            self.asymmetry_since = None;
        }

        // Rep edges. The violation flag is read before the reset below:
        // a violation still latched when the arms come down discards the rep
        if both_raised && !self.arms_raised {
            self.arms_raised = true;
        } else if both_lowered && self.arms_raised {
            self.arms_raised = false;
            if !self.form_violation {
                self.rep_count += 1;
            }
        }

        // Violation reset once the limbs agree again
        if left_raised == right_raised {
            let clear = match self.config.violation_policy {
                ViolationPolicy::ClearOnMatch => true,
                ViolationPolicy::LatchUntilLowered => both_lowered,
            };
            if clear {
                self.form_violation = false;
            }
        }

        self.wrist_elevation = Some(normalized_wrist_height(left_wrist.y, right_wrist.y));
        self.last_pose_timestamp = Some(snapshot.timestamp);
    }

    /// Immutable copy of the current state for observers
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            rep_count: self.rep_count,
            arms_raised: self.arms_raised,
            form_violation: self.form_violation,
            wrist_elevation: self.wrist_elevation,
            last_pose_timestamp: self.last_pose_timestamp,
        }
    }

    /// Return to the session-start state, keeping the configuration
    pub fn reset(&mut self) {
        let config = self.config.clone();
        *self = Self::new(config);
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

/// Map the average wrist height into [0, 1] across the calibrated band
fn normalized_wrist_height(left_y: f32, right_y: f32) -> f32 {
    let average = (left_y + right_y) / 2.0;
    let mapped = (average - WRIST_BAND_TOP) / (WRIST_BAND_BOTTOM - WRIST_BAND_TOP);
    mapped.clamp(0.0, 1.0)
}
