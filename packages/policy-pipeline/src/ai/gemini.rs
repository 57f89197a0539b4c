//! Gemini implementation of the `TextGenerator` trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use policy_pipeline::ai::GeminiGenerator;
//!
//! let generator = GeminiGenerator::new(config.gemini_api_key.clone())
//!     .with_model("gemini-2.5-flash");
//! ```

use std::time::Duration;

use async_trait::async_trait;
use gemini_client::{GeminiClient, GeminiError, GenerationConfig};

use crate::config::DEFAULT_MODEL;
use crate::error::{GenerationError, GenerationResult};
use crate::security::ApiKey;
use crate::traits::generator::{GenerationParams, TextGenerator};

/// Gemini-based text generator.
pub struct GeminiGenerator {
    client: GeminiClient,
    model: String,
    timeout: Option<Duration>,
}

impl GeminiGenerator {
    /// Create a generator for the default model.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            client: GeminiClient::new(api_key.expose()),
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }

    /// Set the model (default: gemini-2.5-flash).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the HTTP client timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> GenerationResult<Self> {
        self.client = self.client.with_timeout(timeout).map_err(map_error)?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> GenerationResult<String> {
        let config = GenerationConfig::new()
            .temperature(params.temperature)
            .max_output_tokens(params.max_output_tokens);

        tracing::debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Calling Gemini");

        let response = self
            .client
            .generate_text(&self.model, prompt, config)
            .await
            .map_err(|e| match e {
                GeminiError::Timeout => GenerationError::Timeout {
                    secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
                },
                other => map_error(other),
            })?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                finish_reason = ?response.finish_reason,
                "Gemini usage"
            );
        }

        Ok(response.text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn map_error(error: GeminiError) -> GenerationError {
    match error {
        GeminiError::Auth(msg) => GenerationError::Auth(msg),
        GeminiError::Quota(msg) => GenerationError::Quota(msg),
        GeminiError::Blocked(reason) => GenerationError::Blocked(reason),
        GeminiError::Timeout => GenerationError::Timeout { secs: 0 },
        GeminiError::Network(msg) => GenerationError::Network(msg),
        GeminiError::Parse(msg) => GenerationError::Parse(msg),
        GeminiError::Config(msg) => GenerationError::Api(msg),
        GeminiError::Api { status, message } => {
            GenerationError::Api(format!("{}: {}", status, message))
        }
    }
}
