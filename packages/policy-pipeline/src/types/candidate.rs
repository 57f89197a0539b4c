//! Search results considered as potential sources.

use serde::{Deserialize, Serialize};
use url::Url;

/// A ranked search result.
///
/// Order in a `Vec<SourceCandidate>` is the search service's ranking; the
/// pipeline never re-sorts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCandidate {
    /// The result URL.
    pub url: Url,

    /// Page title from the search service (may be empty).
    pub title: String,

    /// Snippet/description from the search service (may be empty).
    pub snippet: String,

    /// Relevance score (0.0-1.0, if provided by the search API).
    pub score: Option<f32>,
}

impl SourceCandidate {
    /// Create a candidate from a URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            title: String::new(),
            snippet: String::new(),
            score: None,
        }
    }

    /// Create from a URL string.
    pub fn from_url(url: &str) -> Option<Self> {
        Url::parse(url).ok().map(Self::new)
    }

    /// Add a title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add a snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Add a relevance score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Host name for progress display.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    /// Title, falling back to the host when the service gave none.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            self.host()
        } else {
            self.title.trim()
        }
    }
}
