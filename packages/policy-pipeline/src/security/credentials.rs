//! API keys for the external services.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;
use std::sync::Arc;

/// An API key tagged with the service it authenticates against.
///
/// Debug and Display print the service name only. The key is held in a
/// `secrecy` box, zeroed on drop, and shared between clones.
#[derive(Clone)]
pub struct ApiKey {
    service: &'static str,
    secret: Arc<SecretBox<str>>,
}

impl ApiKey {
    /// Surrounding whitespace (a common `.env` artifact) is dropped.
    pub fn new(service: &'static str, key: impl AsRef<str>) -> Self {
        Self {
            service,
            secret: Arc::new(SecretBox::new(Box::from(key.as_ref().trim()))),
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Only call this when building a request.
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn is_blank(&self) -> bool {
        self.expose().is_empty()
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}: [REDACTED])", self.service)
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} key [REDACTED]", self.service)
    }
}
