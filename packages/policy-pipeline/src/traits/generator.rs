//! Text generation trait.

use async_trait::async_trait;

use crate::error::GenerationResult;

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_output_tokens: 8_192,
        }
    }
}

/// LLM text generation.
///
/// Implementations wrap a specific provider and map its failures onto
/// [`GenerationError`](crate::error::GenerationError). A single call, no
/// retries, no streaming.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> GenerationResult<String>;

    /// Model identifier recorded on the generated document.
    fn model(&self) -> &str;
}
