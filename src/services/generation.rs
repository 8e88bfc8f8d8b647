//! Language-generation HTTP client
//!
//! Turns a feedback category prompt or a transcribed voice query into one
//! spoken coaching sentence. Supports retry with exponential backoff for
//! transient failures and a configurable timeout.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use super::{map_request_error, ServiceError};

/// Default timeout for generation requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff in milliseconds.
const BASE_RETRY_DELAY_MS: u64 = 100;

/// Sampling parameters for one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl SamplingOptions {
    /// Short, varied sentences for live coaching feedback.
    pub fn live_feedback() -> Self {
        Self {
            temperature: 0.9,
            max_output_tokens: 50,
        }
    }

    /// Slightly longer replies for spoken user queries.
    pub fn voice_query() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 150,
        }
    }
}

/// Request body for the generation endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<&'a str>,
    sampling_options: SamplingOptions,
}

/// Response from the generation endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub text: String,
    /// Total tokens billed for the request, when the service reports it.
    #[serde(default)]
    pub token_usage: Option<u64>,
}

/// HTTP client for the language-generation service.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    api_key: Option<String>,
}

impl GenerationClient {
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

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends a single generate request (internal helper).
    async fn send_generate_request(
        &self,
        request: &GenerateRequest<'_>,
        api_key: &str,
    ) -> Result<GenerationResponse, ServiceError> {
        let url = format!("{}/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
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

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| ServiceError::ParseError(e.to_string()))
    }

    /// Generates one coaching sentence.
    ///
    /// Retries transient failures up to 3 times with exponential backoff
    /// (100 ms, 200 ms, 400 ms). A missing API key fails this request only.
    pub async fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
        options: SamplingOptions,
    ) -> Result<GenerationResponse, ServiceError> {
        if prompt.trim().is_empty() {
            return Err(ServiceError::EmptyInput("prompt"));
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::AuthConfiguration("generation"))?;

        let request = GenerateRequest {
            prompt,
            system_instruction,
            sampling_options: options,
        };

        tracing::debug!(
            "Sending generate request ({} prompt chars, system instruction: {})",
            prompt.len(),
            system_instruction.is_some()
        );

        let mut last_error: Option<ServiceError> = None;

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            match self.send_generate_request(&request, api_key).await {
                Ok(response) => {
                    if attempt > 0 {
                        tracing::debug!("Request succeeded on attempt {}", attempt + 1);
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if !e.is_retryable() || attempt == MAX_RETRY_ATTEMPTS - 1 {
                        tracing::error!(
                            "Generation request failed (attempt {}): {}",
                            attempt + 1,
                            e
                        );
                        last_error = Some(e);
                        break;
                    }

                    let delay_ms = BASE_RETRY_DELAY_MS * 2u64.pow(attempt);
                    tracing::warn!(
                        "Generation request failed (attempt {}), retrying in {}ms: {}",
                        attempt + 1,
                        delay_ms,
                        e
                    );
                    last_error = Some(e);
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }

        Err(ServiceError::RetriesExhausted {
            attempts: MAX_RETRY_ATTEMPTS,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GenerationClient::new("http://localhost:9090", Some("key".into()));
        assert_eq!(client.base_url, "http://localhost:9090");
        assert_eq!(client.timeout().as_secs(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_client_with_custom_timeout() {
        let client = GenerationClient::with_timeout("http://example.com", None, 60);
        assert_eq!(client.timeout().as_secs(), 60);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_auth_error() {
        let client = GenerationClient::new("http://localhost:9090", None);
        let result = client
            .generate("say something nice", None, SamplingOptions::live_feedback())
            .await;
        assert!(matches!(result, Err(ServiceError::AuthConfiguration(_))));
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_locally() {
        let client = GenerationClient::new("http://localhost:9090", Some("key".into()));
        let result = client
            .generate("   ", None, SamplingOptions::live_feedback())
            .await;
        assert!(matches!(result, Err(ServiceError::EmptyInput(_))));
    }

    #[test]
    fn test_request_serialisation() {
        let request = GenerateRequest {
            prompt: "cheer the user on",
            system_instruction: Some("You are a coach."),
            sampling_options: SamplingOptions::live_feedback(),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"prompt\":\"cheer the user on\""));
        assert!(json.contains("\"systemInstruction\":\"You are a coach.\""));
        assert!(json.contains("\"maxOutputTokens\":50"));
    }

    #[test]
    fn test_request_serialisation_without_system() {
        let request = GenerateRequest {
            prompt: "x",
            system_instruction: None,
            sampling_options: SamplingOptions::voice_query(),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("systemInstruction"));
        assert!(json.contains("\"temperature\":0.7"));
    }

    #[test]
    fn test_response_deserialisation() {
        let response: GenerationResponse =
            serde_json::from_str(r#"{"text": "Nice rep!", "tokenUsage": 12}"#).unwrap();
        assert_eq!(response.text, "Nice rep!");
        assert_eq!(response.token_usage, Some(12));

        let response: GenerationResponse =
            serde_json::from_str(r#"{"text": "Nice rep!"}"#).unwrap();
        assert_eq!(response.token_usage, None);
    }

    #[test]
    fn test_sampling_presets() {
        let live = SamplingOptions::live_feedback();
        assert_eq!(live.max_output_tokens, 50);

        let query = SamplingOptions::voice_query();
        assert_eq!(query.max_output_tokens, 150);
        assert!(query.temperature < live.temperature);
    }
}
