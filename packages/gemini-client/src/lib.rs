//! Pure Gemini REST API client
//!
//! A minimal client for the Gemini `generateContent` endpoint with no
//! domain-specific logic.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::{GeminiClient, GenerationConfig};
//!
//! let client = GeminiClient::from_env()?;
//!
//! let response = client
//!     .generate_text(
//!         "gemini-2.5-flash",
//!         "Write a haiku about labour law",
//!         GenerationConfig::new().temperature(0.4),
//!     )
//!     .await?;
//! println!("{}", response.text);
//! ```

pub mod error;
pub mod types;

pub use error::{GeminiError, Result};
pub use types::*;

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from environment variable `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies, Vertex gateways, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Rebuild the HTTP client with a request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeminiError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw `generateContent` call.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                GeminiError::from_reqwest(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Gemini API error");
            return Err(GeminiError::from_status(status.as_u16(), &error_text));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        debug!(
            model = %model,
            duration_ms = start.elapsed().as_millis(),
            candidates = body.candidates.len(),
            "Gemini generateContent"
        );

        Ok(body)
    }

    /// Single-prompt text generation.
    ///
    /// Blocked prompts become [`GeminiError::Blocked`]. An empty completion
    /// is returned as-is; callers decide whether that is an error.
    pub async fn generate_text(
        &self,
        model: &str,
        prompt: impl Into<String>,
        config: GenerationConfig,
    ) -> Result<TextResponse> {
        let request = GenerateContentRequest::from_prompt(prompt).config(config);
        let response = self.generate_content(model, &request).await?;
        into_text_response(response)
    }
}

fn into_text_response(response: GenerateContentResponse) -> Result<TextResponse> {
    let text = response.text().unwrap_or_default();

    if text.trim().is_empty() {
        if let Some(reason) = response.block_reason() {
            return Err(GeminiError::Blocked(reason));
        }
    }

    Ok(TextResponse {
        text,
        finish_reason: response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.clone()),
        usage: response.usage_metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = GeminiClient::new("key-test").with_base_url("https://proxy.local/v1beta/");

        assert_eq!(client.api_key, "key-test");
        assert_eq!(client.base_url(), "https://proxy.local/v1beta");
    }

    #[test]
    fn test_blocked_response_is_error() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}}"#)
                .unwrap();
        assert!(matches!(
            into_text_response(response),
            Err(GeminiError::Blocked(reason)) if reason == "PROHIBITED_CONTENT"
        ));
    }

    #[test]
    fn test_empty_response_is_passed_through() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": []}, "finishReason": "STOP"}]}"#)
                .unwrap();
        let text = into_text_response(response).unwrap();
        assert!(text.text.is_empty());
        assert_eq!(text.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        let client = GeminiClient::new("key-test").with_base_url("http://127.0.0.1:9/v1beta");
        let result = tokio_test::block_on(client.generate_text(
            "gemini-2.5-flash",
            "hello",
            GenerationConfig::new(),
        ));
        assert!(matches!(result, Err(GeminiError::Network(_))));
    }
}
