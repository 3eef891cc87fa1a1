// Tracking session - wires the pose sampler to the rep tracker and
// publishes read-only state for the application layer to poll

use crate::core::pose_sampler::{PoseSampler, SamplerError};
use crate::core::rep_tracker::RepTracker;
use crate::models::tracker::{TrackerConfig, TrackerSnapshot};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One exercise-tracking session.
///
/// The `RepTracker` lives inside the evaluation task: privately owned,
/// mutated only there, visible elsewhere only through the published
/// `TrackerSnapshot` copies. Session boundaries (when to create and discard
/// one of these) belong to the embedding application.
pub struct TrackingSession {
    id: String,
    device_id: String,
    started_at: i64,
    sampler: Arc<PoseSampler>,
    tracker_config: TrackerConfig,
    evaluation_interval: Duration,
    published: Arc<RwLock<TrackerSnapshot>>,
    is_running: Arc<RwLock<bool>>,
}

impl TrackingSession {
    pub fn new(
        sampler: PoseSampler,
        tracker_config: TrackerConfig,
        evaluation_interval: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            device_id: get_device_id(),
            started_at: chrono::Utc::now().timestamp_millis(),
            sampler: Arc::new(sampler),
            tracker_config,
            evaluation_interval,
            published: Arc::new(RwLock::new(TrackerSnapshot::default())),
            is_running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the sampler and the evaluation loop
    pub async fn start(&self, camera_device_id: u32) -> Result<(), SamplerError> {
        let mut is_running = self.is_running.write().await;
        if *is_running {
            return Err(SamplerError::AlreadyRunning);
        }

        self.sampler.start(camera_device_id).await?;
        *is_running = true;

        let sampler = self.sampler.clone();
        let tracker_config = self.tracker_config.clone();
        let published = self.published.clone();
        let is_running_flag = self.is_running.clone();
        let evaluation_interval = self.evaluation_interval;

        tokio::spawn(async move {
            Self::evaluation_loop(
                sampler,
                tracker_config,
                published,
                is_running_flag,
                evaluation_interval,
            )
            .await;
        });

        println!("Started tracking session {}", self.id);
        Ok(())
    }

    /// Consumer-paced evaluation: re-reads whatever pose is newest each
    /// tick and feeds it through the tracker. Snapshots already processed
    /// (same capture timestamp) are skipped; correctness does not depend on
    /// the skip, only efficiency.
    async fn evaluation_loop(
        sampler: Arc<PoseSampler>,
        tracker_config: TrackerConfig,
        published: Arc<RwLock<TrackerSnapshot>>,
        is_running: Arc<RwLock<bool>>,
        evaluation_interval: Duration,
    ) {
        let mut tracker = RepTracker::new(tracker_config);
        let mut last_processed: Option<i64> = None;

        loop {
            if !*is_running.read().await {
                break;
            }

            if let Some(snapshot) = sampler.latest().await {
                if last_processed != Some(snapshot.timestamp) {
                    tracker.process_snapshot(&snapshot, Instant::now());
                    last_processed = Some(snapshot.timestamp);
                    *published.write().await = tracker.snapshot();
                }
            }

            tokio::time::sleep(evaluation_interval).await;
        }
    }

    /// Current tracker state as an immutable copy, poll-safe from any task
    /// at any rate
    pub async fn snapshot(&self) -> TrackerSnapshot {
        *self.published.read().await
    }

    /// Stop the evaluation loop and the sampler
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.sampler.stop().await;
        println!("Stopped tracking session {}", self.id);
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    /// The underlying sampler, e.g. to inspect a terminal camera error
    pub fn sampler(&self) -> &PoseSampler {
        &self.sampler
    }
}

fn get_device_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
