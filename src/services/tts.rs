//! Speech-synthesis HTTP client
//!
//! Converts one generated coaching sentence into audio bytes for playback.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{map_request_error, ServiceError};

/// Default timeout for synthesis requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Voice rendering parameters sent with every synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        // Stable, consistent delivery suited to short coaching lines
        Self {
            stability: 0.7,
            similarity_boost: 0.8,
            style: 0.2,
            use_speaker_boost: true,
        }
    }
}

/// Request body for the synthesis endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// HTTP client for the speech-synthesis service.
#[derive(Debug, Clone)]
pub struct SpeechSynthesisClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    api_key: Option<String>,
}

impl SpeechSynthesisClient {
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

    /// Synthesises `text` into playable audio bytes.
    pub async fn synthesise(
        &self,
        text: &str,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> Result<Vec<u8>, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::EmptyInput("text"));
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::AuthConfiguration("speech-synthesis"))?;

        let request = SynthesisRequest {
            text,
            voice_id,
            voice_settings: settings,
        };

        let url = format!("{}/text-to-speech", self.base_url);
        tracing::debug!("Synthesising {} characters with voice {}", text.len(), voice_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
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

        let audio = response
            .bytes()
            .await
            .map_err(|e| map_request_error(e, self.timeout.as_secs()))?;

        tracing::debug!("Received {} bytes of synthesised audio", audio.len());
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_voice_settings() {
        let settings = VoiceSettings::default();
        assert!((settings.stability - 0.7).abs() < 1e-6);
        assert!((settings.similarity_boost - 0.8).abs() < 1e-6);
        assert!(settings.use_speaker_boost);
    }

    #[test]
    fn test_request_serialisation() {
        let settings = VoiceSettings::default();
        let request = SynthesisRequest {
            text: "Keep pushing!",
            voice_id: "coach-voice-1",
            voice_settings: &settings,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"text\":\"Keep pushing!\""));
        assert!(json.contains("\"voiceId\":\"coach-voice-1\""));
        assert!(json.contains("\"similarity_boost\":0.8"));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_locally() {
        let client = SpeechSynthesisClient::new("http://localhost:9090", Some("key".into()));
        let result = client
            .synthesise("", "coach-voice-1", &VoiceSettings::default())
            .await;
        assert!(matches!(result, Err(ServiceError::EmptyInput("text"))));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_auth_error() {
        let client = SpeechSynthesisClient::new("http://localhost:9090", None);
        let result = client
            .synthesise("Nice work", "coach-voice-1", &VoiceSettings::default())
            .await;
        assert!(matches!(result, Err(ServiceError::AuthConfiguration(_))));
    }
}
