//! Browser automation traits.
//!
//! A `BrowserLauncher` starts one `BrowserSession` per run; the session
//! opens one page per render and closes it on every exit path.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::RenderResult;

/// Rendered output of one page load.
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    /// Final URL after redirects.
    pub url: String,

    /// Serialized DOM after scripts ran.
    pub html: String,

    /// `document.contentType` as reported by the browser.
    pub content_type: String,

    /// Document title (if any).
    pub title: Option<String>,
}

impl RenderedPage {
    /// Create an HTML page.
    pub fn html(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            content_type: "text/html".to_string(),
            title: None,
        }
    }

    /// Check if the browser rendered an HTML (or XHTML) document.
    pub fn is_html(&self) -> bool {
        let ct = self.content_type.to_ascii_lowercase();
        ct.is_empty() || ct.contains("html")
    }
}

/// Locates and starts a browser.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Check that a browser binary is available without starting it.
    fn probe(&self) -> RenderResult<PathBuf>;

    /// Start a browser process for one run.
    async fn launch(&self) -> RenderResult<Box<dyn BrowserSession>>;
}

/// A running browser, shared by all page loads of one run.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url` in a fresh page and return its rendered HTML.
    ///
    /// The page is closed before this returns, and also when the future is
    /// dropped mid-flight.
    async fn render(&self, url: &str) -> RenderResult<RenderedPage>;

    /// Close the browser and wait for the process to exit.
    async fn shutdown(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html() {
        let mut page = RenderedPage::html("https://example.gov", "<p>x</p>");
        assert!(page.is_html());

        page.content_type = "application/xhtml+xml".into();
        assert!(page.is_html());

        page.content_type = "application/pdf".into();
        assert!(!page.is_html());
    }
}
