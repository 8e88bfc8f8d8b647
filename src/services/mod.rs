//! External service clients
//!
//! HTTP clients for the language-generation, speech-to-text and
//! speech-synthesis collaborators. Every failure here is transient from the
//! session's point of view: a failed call degrades one feedback event or one
//! voice exchange, never the training loop.

pub mod generation;
pub mod stt;
pub mod tts;

pub use generation::{GenerationClient, GenerationResponse, SamplingOptions};
pub use stt::SpeechToTextClient;
pub use tts::{SpeechSynthesisClient, VoiceSettings};

/// Error types for external service calls.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Missing credentials for the {0} service")]
    AuthConfiguration(&'static str),

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("All {attempts} retry attempts failed: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl ServiceError {
    /// Whether a retry could plausibly succeed. Credential and input
    /// problems are deterministic and never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::ConnectionFailed(_) | ServiceError::Timeout(_) => true,
            ServiceError::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Maps a reqwest error to the service error taxonomy.
pub(crate) fn map_request_error(e: reqwest::Error, timeout_secs: u64) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout(timeout_secs)
    } else {
        ServiceError::ConnectionFailed(e.to_string())
    }
}
