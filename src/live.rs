//! Live landmark feed
//!
//! Subscribes to the external pose-detection service: roughly once per
//! second it requests the current landmarks, rep count and raw form message
//! for a workout and republishes them on a bounded channel. A failed poll is
//! logged and skipped; the feed itself never terminates training.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::landmarks::LandmarkPoint;
use crate::services::{map_request_error, ServiceError};

/// Nominal tick rate of the pose-detection service.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Channel depth; the consumer is expected to keep up at ~1 Hz.
const CHANNEL_CAPACITY: usize = 8;

/// One tick's payload from the pose-detection service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LivePayload {
    #[serde(default)]
    pub landmarks: Vec<LandmarkPoint>,
    /// Externally-counted repetitions so far.
    #[serde(default)]
    pub reps: u32,
    /// Raw form message, e.g. a depth or back-posture warning.
    #[serde(default)]
    pub message: Option<String>,
}

/// Polling subscriber for the live landmark channel.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    base_url: String,
    client: reqwest::Client,
    interval: Duration,
}

impl LiveFeed {
    pub fn new(base_url: impl Into<String>, interval: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(interval)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
            interval,
        }
    }

    /// Requests one payload for a workout.
    pub async fn fetch(&self, workout_id: u32) -> Result<LivePayload, ServiceError> {
        let url = format!("{}/landmarks/{}", self.base_url, workout_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.interval.as_secs()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ServiceError::ServerError { status, message });
        }

        response
            .json::<LivePayload>()
            .await
            .map_err(|e| ServiceError::ParseError(e.to_string()))
    }

    /// Starts polling for `workout_id`, delivering payloads in arrival
    /// order. Polling stops when the receiver is dropped.
    pub fn subscribe(&self, workout_id: u32) -> mpsc::Receiver<LivePayload> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let feed = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(feed.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match feed.fetch(workout_id).await {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            tracing::debug!("Live feed receiver dropped, stopping poll loop");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Live feed poll failed for workout {}: {}", workout_id, e);
                    }
                }
            }
        });

        rx
    }
}
