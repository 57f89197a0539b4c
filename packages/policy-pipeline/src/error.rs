//! Typed errors for the policy pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so the presentation
//! layer can tell failure kinds apart and show an actionable message.

use thiserror::Error;

use crate::types::stage::PipelineStage;

/// Terminal failure of a pipeline run.
///
/// Per-page extraction failures are deliberately absent: they are absorbed
/// by the content extractor and never end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad request parameters (empty country, oversized policy type, ...)
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Credentials or tunables absent or unusable
    #[error("configuration missing: {key} ({reason})")]
    ConfigurationMissing { key: String, reason: String },

    /// Search service error
    #[error("source retrieval failed: {0}")]
    RetrievalFailed(#[from] SearchError),

    /// Browser driver cannot be found or started
    #[error("browser environment unavailable: {0}")]
    EnvironmentUnavailable(#[from] RenderError),

    /// Generation model error or empty response
    #[error("generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    /// No extracted document had usable text
    #[error("no usable source text ({attempted} sources attempted)")]
    EmptyContext { attempted: usize },

    /// Caller cancelled the run
    #[error("run cancelled during {stage}")]
    Cancelled { stage: PipelineStage },
}

/// Coarse failure category for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ConfigurationMissing,
    RetrievalFailed,
    EnvironmentUnavailable,
    GenerationFailed,
    EmptyContext,
    Cancelled,
}

impl PipelineError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigurationMissing {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::ConfigurationMissing { .. } => ErrorKind::ConfigurationMissing,
            Self::RetrievalFailed(_) => ErrorKind::RetrievalFailed,
            Self::EnvironmentUnavailable(_) => ErrorKind::EnvironmentUnavailable,
            Self::GenerationFailed(_) => ErrorKind::GenerationFailed,
            Self::EmptyContext { .. } => ErrorKind::EmptyContext,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// What the operator can do about it.
    pub fn user_hint(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "Check the country and policy type you entered.",
            Self::ConfigurationMissing { .. } => {
                "Check your .env file: TAVILY_API_KEY and GEMINI_API_KEY must be set and tunables must be valid numbers."
            }
            Self::RetrievalFailed(SearchError::Auth(_)) => {
                "The search service rejected the credentials. Check TAVILY_API_KEY."
            }
            Self::RetrievalFailed(SearchError::Quota(_)) => {
                "The search service quota is exhausted. Try again later."
            }
            Self::RetrievalFailed(_) => {
                "The search service could not be reached. Check your internet connection and try again."
            }
            Self::EnvironmentUnavailable(_) => {
                "Install Chrome or Chromium, or point CHROME_BIN at an existing binary."
            }
            Self::GenerationFailed(GenerationError::Auth(_)) => {
                "The generation service rejected the credentials. Check GEMINI_API_KEY."
            }
            Self::GenerationFailed(GenerationError::Quota(_)) => {
                "The generation service quota is exhausted. Try again later."
            }
            Self::GenerationFailed(GenerationError::Blocked(_)) => {
                "The model refused this request. Try rephrasing the policy type."
            }
            Self::GenerationFailed(_) => "Policy generation failed. Please try again.",
            Self::EmptyContext { .. } => {
                "Search returned no usable sources. Try a different country or policy type."
            }
            Self::Cancelled { .. } => "The run was cancelled. Start again when ready.",
        }
    }
}

/// Errors from the search service.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Credential rejected (401/403)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Plan or rate limit exhausted
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// No response within the configured timeout
    #[error("search timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Any other non-2xx response
    #[error("search API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("malformed search response: {0}")]
    Parse(String),
}

/// Errors from the browser driver.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Driver binary missing or refused to start
    #[error("browser unavailable: {0}")]
    Unavailable(String),

    /// Navigation failed (DNS, TLS, HTTP error page, ...)
    #[error("failed to navigate to {url}: {details}")]
    Navigation { url: String, details: String },

    /// Browser process or websocket died
    #[error("browser session lost: {0}")]
    Crashed(String),

    /// Page is not an HTML document (PDF viewer, image, ...)
    #[error("non-text content at {url}: {content_type}")]
    NotHtml { url: String, content_type: String },
}

/// Errors from the text-generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    /// Content-policy rejection
    #[error("blocked by content policy: {0}")]
    Blocked(String),

    #[error("generation timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("malformed response: {0}")]
    Parse(String),

    /// Model returned no text
    #[error("model returned an empty response")]
    Empty,
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, chrome://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, cloud metadata)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Result type alias for browser operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Result type alias for generation operations.
pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

/// Result type alias for security operations.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinguishable() {
        let errors = [
            PipelineError::invalid_input("empty country"),
            PipelineError::config("TAVILY_API_KEY", "not set"),
            SearchError::Auth("bad key".into()).into(),
            RenderError::Unavailable("no chrome".into()).into(),
            GenerationError::Empty.into(),
            PipelineError::EmptyContext { attempted: 5 },
            PipelineError::Cancelled {
                stage: PipelineStage::Extracting,
            },
        ];

        let kinds: Vec<_> = errors.iter().map(PipelineError::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::InvalidInput,
                ErrorKind::ConfigurationMissing,
                ErrorKind::RetrievalFailed,
                ErrorKind::EnvironmentUnavailable,
                ErrorKind::GenerationFailed,
                ErrorKind::EmptyContext,
                ErrorKind::Cancelled,
            ]
        );
    }

    #[test]
    fn test_hints_are_actionable() {
        let auth: PipelineError = SearchError::Auth("401".into()).into();
        assert!(auth.user_hint().contains("TAVILY_API_KEY"));

        let empty = PipelineError::EmptyContext { attempted: 3 };
        assert!(empty.user_hint().contains("different country"));

        let gen: PipelineError = GenerationError::Auth("403".into()).into();
        assert!(gen.user_hint().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_display_includes_cause() {
        let err: PipelineError = SearchError::Status {
            status: 500,
            body: "upstream".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "source retrieval failed: search API returned 500: upstream"
        );
    }
}
