//! Gemini API request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// generateContent request
// =============================================================================

/// `models/{model}:generateContent` request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns
    pub contents: Vec<Content>,

    /// Optional system instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    /// Sampling parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Single-turn request with one user prompt.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            ..Default::default()
        }
    }

    /// Set a system instruction.
    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content {
            role: None,
            parts: vec![Part::text(instruction)],
        });
        self
    }

    /// Set generation parameters.
    pub fn config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

/// A conversation turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    /// "user" or "model"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A content part. Only text parts are used by this client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Sampling parameters.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature (0.0 to 2.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max output tokens.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

// =============================================================================
// generateContent response
// =============================================================================

/// `generateContent` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,

    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(Content::text)
    }

    /// Reason the prompt or first candidate was blocked, if it was.
    pub fn block_reason(&self) -> Option<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Some(reason);
        }
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|r| matches!(*r, "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII"))
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,

    #[serde(default)]
    pub candidates_token_count: u32,

    #[serde(default)]
    pub total_token_count: u32,
}

/// Text completion returned by [`crate::GeminiClient::generate_text`].
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Option<UsageMetadata>,
}

// =============================================================================
// Error body
// =============================================================================

/// `{"error": {"code", "message", "status", "details": [{"reason"}]}}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ApiErrorInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorInfo {
    #[serde(default)]
    reason: Option<String>,
}

impl ApiErrorBody {
    /// Parse an error body; unparseable bodies keep the raw text as message.
    pub(crate) fn parse(body: &str) -> Self {
        let mut parsed = serde_json::from_str::<ApiErrorBody>(body).unwrap_or_default();
        if parsed.error.message.is_empty() {
            parsed.error.message = body.trim().to_string();
        }
        parsed
    }

    /// Best-effort error message: the API's own message, else the raw body.
    pub(crate) fn message(&self) -> &str {
        &self.error.message
    }

    /// True if the canonical status or any detail reason is one of `codes`.
    pub(crate) fn has_code(&self, codes: &[&str]) -> bool {
        codes.contains(&self.error.status.as_str())
            || self
                .error
                .details
                .iter()
                .filter_map(|d| d.reason.as_deref())
                .any(|reason| codes.contains(&reason))
    }
}
