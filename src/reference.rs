//! Reference motion store
//!
//! Loads the canonical motion recording for a workout from the motion
//! service: a JSON array of frames, each with a `landmarks` array of
//! `{id, x, y, z}` points. Loaded once per workout selection and read-only
//! thereafter. Fetch or parse failures degrade to an empty sequence so that
//! training continues with a zero accuracy score rather than aborting.

use std::time::Duration;

use crate::landmarks::Frame;

/// Error types for reference motion loading.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("Failed to fetch reference motion: {0}")]
    Fetch(String),

    #[error("No reference motion published for workout {0}")]
    NotFound(u32),

    #[error("Malformed reference data: {0}")]
    Malformed(String),
}

/// Immutable ordered reference frames for one workout.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSequence {
    frames: Vec<Frame>,
}

impl ReferenceSequence {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// An empty sequence; scoring against it always yields 0.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Parses a sequence from the service's JSON frame array.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ReferenceError> {
        let frames: Vec<Frame> =
            serde_json::from_slice(bytes).map_err(|e| ReferenceError::Malformed(e.to_string()))?;
        Ok(Self::new(frames))
    }
}

/// Fetches reference sequences over HTTP, one per workout selection.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    base_url: String,
    client: reqwest::Client,
}

impl ReferenceStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Fetches the reference motion for a workout.
    pub async fn load(&self, workout_id: u32) -> Result<ReferenceSequence, ReferenceError> {
        let url = format!("{}/{}.json", self.base_url, workout_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ReferenceError::Fetch(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ReferenceError::NotFound(workout_id));
        }
        if !response.status().is_success() {
            return Err(ReferenceError::Fetch(format!(
                "status {} for {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReferenceError::Fetch(e.to_string()))?;

        let sequence = ReferenceSequence::from_json(&bytes)?;
        tracing::info!(
            "Loaded reference motion for workout {} ({} frames)",
            workout_id,
            sequence.len()
        );
        Ok(sequence)
    }

    /// Like [`load`](Self::load), but degrades to an empty sequence.
    ///
    /// Reference data is not essential to training: a missing or malformed
    /// recording means accuracy reads 0 until the next workout selection.
    pub async fn load_or_empty(&self, workout_id: u32) -> ReferenceSequence {
        match self.load(workout_id).await {
            Ok(sequence) => sequence,
            Err(e) => {
                tracing::warn!(
                    "Reference motion unavailable for workout {}: {}",
                    workout_id,
                    e
                );
                ReferenceSequence::empty()
            }
        }
    }
}
