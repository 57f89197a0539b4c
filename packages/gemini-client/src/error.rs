//! Error types for Gemini client.

use thiserror::Error;

use crate::types::ApiErrorBody;

const AUTH_CODES: &[&str] = &["API_KEY_INVALID", "UNAUTHENTICATED", "PERMISSION_DENIED"];
const QUOTA_CODES: &[&str] = &["RESOURCE_EXHAUSTED"];

/// Result type for Gemini client operations.
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Gemini client errors.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the client timeout
    #[error("Request timed out")]
    Timeout,

    /// API key rejected (401/403, or 400 with `API_KEY_INVALID`)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Quota or rate limit exhausted (429)
    #[error("Quota exceeded: {0}")]
    Quota(String),

    /// Prompt or response blocked by the content policy
    #[error("Blocked by content policy: {0}")]
    Blocked(String),

    /// Any other non-2xx response
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GeminiError {
    /// Map a non-success HTTP status and its body to an error.
    ///
    /// Gemini reports a bad key as 400 `INVALID_ARGUMENT` with reason
    /// `API_KEY_INVALID`, so the body's codes are checked before the status.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let error = ApiErrorBody::parse(body);
        let message = error.message().to_string();

        if matches!(status, 401 | 403) || error.has_code(AUTH_CODES) {
            GeminiError::Auth(message)
        } else if status == 429 || error.has_code(QUOTA_CODES) {
            GeminiError::Quota(message)
        } else {
            GeminiError::Api { status, message }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeminiError::Timeout
        } else {
            GeminiError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(GeminiError::from_status(401, ""), GeminiError::Auth(_)));
        assert!(matches!(GeminiError::from_status(403, ""), GeminiError::Auth(_)));
        assert!(matches!(GeminiError::from_status(429, ""), GeminiError::Quota(_)));
        assert!(matches!(
            GeminiError::from_status(500, "boom"),
            GeminiError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_invalid_key_is_auth() {
        let body = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID",
                    "domain": "googleapis.com",
                    "metadata": {"service": "generativelanguage.googleapis.com"}
                }]
            }
        }"#;
        match GeminiError::from_status(400, body) {
            GeminiError::Auth(message) => {
                assert_eq!(message, "API key not valid. Please pass a valid API key.")
            }
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn test_canonical_status_codes() {
        let denied = r#"{"error":{"code":400,"message":"denied","status":"PERMISSION_DENIED"}}"#;
        assert!(matches!(GeminiError::from_status(400, denied), GeminiError::Auth(_)));

        let exhausted = r#"{"error":{"code":400,"message":"out","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(GeminiError::from_status(400, exhausted), GeminiError::Quota(_)));
    }

    #[test]
    fn test_plain_bad_request_stays_api_error() {
        let body = r#"{"error":{"code":400,"message":"Invalid JSON payload","status":"INVALID_ARGUMENT"}}"#;
        match GeminiError::from_status(400, body) {
            GeminiError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid JSON payload");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
