//! Speech-to-text HTTP client
//!
//! Uploads a recorded audio blob and returns the transcript. An empty blob
//! is rejected locally without issuing a request.

use std::time::Duration;

use serde::Deserialize;

use super::{map_request_error, ServiceError};

/// Default timeout for transcription requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Response from the transcription endpoint.
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client for the speech-to-text service.
#[derive(Debug, Clone)]
pub struct SpeechToTextClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    api_key: Option<String>,
}

impl SpeechToTextClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        let timeout = Duration::from_secs(timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
            timeout,
            api_key,
        }
    }

    /// Transcribes a recorded audio blob.
    ///
    /// `mime_type` picks the upload container (e.g. `audio/wav`); the
    /// filename extension is derived from it to help the server decode.
    pub async fn transcribe(&self, audio: Vec<u8>, mime_type: &str) -> Result<String, ServiceError> {
        if audio.is_empty() {
            return Err(ServiceError::EmptyInput("audio"));
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::AuthConfiguration("speech-to-text"))?;

        let extension = extension_for_mime(mime_type);
        let audio_len = audio.len();
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(format!("recording.{}", extension))
            .mime_str(mime_type)
            .map_err(|e| ServiceError::ParseError(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let url = format!("{}/speech-to-text", self.base_url);
        tracing::debug!("Uploading {} bytes of audio for transcription", audio_len);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.timeout.as_secs()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ServiceError::ServerError { status, message });
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::ParseError(e.to_string()))?;

        tracing::debug!("Transcribed {} characters", parsed.text.len());
        Ok(parsed.text)
    }
}

/// Picks a filename extension for the upload from its MIME type.
fn extension_for_mime(mime_type: &str) -> &'static str {
    if mime_type.contains("mp4") {
        "m4a"
    } else if mime_type.contains("ogg") {
        "ogg"
    } else if mime_type.contains("wav") {
        "wav"
    } else {
        "webm"
    }
}
