//! Content extraction: render each candidate and reduce it to plain text.
//!
//! Failures are absorbed here. A page that times out, crashes the tab,
//! is not HTML or has no readable text yields an `ExtractedDocument` with
//! empty text, and the run continues.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use governor::{Quota, RateLimiter};

use crate::pipeline::html_text::html_to_text;
use crate::traits::browser::BrowserSession;
use crate::traits::progress::ProgressReporter;
use crate::types::candidate::SourceCandidate;
use crate::types::document::ExtractedDocument;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Renders candidates through a browser session with bounded fan-out.
pub struct ContentExtractor {
    page_timeout: Duration,
    max_chars_per_page: usize,
    concurrency: usize,
    limiter: Option<Arc<DefaultRateLimiter>>,
}

impl ContentExtractor {
    pub fn new(page_timeout: Duration, max_chars_per_page: usize) -> Self {
        Self {
            page_timeout,
            max_chars_per_page,
            concurrency: 1,
            limiter: None,
        }
    }

    /// Maximum pages open at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Throttle page loads to `pages_per_second`.
    pub fn with_rate_limit(mut self, pages_per_second: NonZeroU32) -> Self {
        let quota = Quota::per_second(pages_per_second);
        self.limiter = Some(Arc::new(RateLimiter::direct(quota)));
        self
    }

    pub fn page_timeout(&self) -> Duration {
        self.page_timeout
    }

    /// Extract one candidate. Never fails; see module docs.
    pub async fn extract(
        &self,
        session: &dyn BrowserSession,
        candidate: &SourceCandidate,
        rank: usize,
    ) -> ExtractedDocument {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let url = candidate.url.as_str();
        let rendered = tokio::time::timeout(self.page_timeout, session.render(url)).await;

        let page = match rendered {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Could not extract content");
                return ExtractedDocument::empty(candidate, rank);
            }
            Err(_) => {
                tracing::warn!(
                    url = %url,
                    timeout_secs = self.page_timeout.as_secs_f32(),
                    "Page load timed out"
                );
                return ExtractedDocument::empty(candidate, rank);
            }
        };

        let text = html_to_text(&page.html, self.max_chars_per_page);
        if text.is_empty() {
            tracing::debug!(url = %url, "Page had no readable text");
        }

        let mut document = ExtractedDocument::new(candidate, rank, text);
        if candidate.title.trim().is_empty() {
            if let Some(title) = page.title.filter(|t| !t.trim().is_empty()) {
                document.title = title.trim().to_string();
            }
        }

        tracing::debug!(url = %url, chars = document.char_len(), "Extracted");
        document
    }

    /// Extract all candidates, at most `concurrency` at a time.
    ///
    /// Results come back in rank order regardless of completion order, and
    /// `progress.source_extracted` fires in that same order.
    pub async fn extract_all(
        &self,
        session: &dyn BrowserSession,
        candidates: &[SourceCandidate],
        progress: &dyn ProgressReporter,
    ) -> Vec<ExtractedDocument> {
        let total = candidates.len();

        let mut results = futures::stream::iter(candidates.iter().enumerate())
            .map(|(rank, candidate)| self.extract(session, candidate, rank))
            .buffered(self.concurrency);

        let mut documents = Vec::with_capacity(total);
        while let Some(document) = results.next().await {
            progress.source_extracted(document.rank, total, &document);
            documents.push(document);
        }
        documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBrowser, RecordingProgress};
    use crate::traits::browser::BrowserLauncher;
    use crate::traits::progress::NoopProgress;
    use std::time::Instant;

    fn candidate(url: &str) -> SourceCandidate {
        SourceCandidate::from_url(url).unwrap()
    }

    #[tokio::test]
    async fn test_extracts_main_text() {
        let browser = MockBrowser::new().with_html(
            "https://www.gov.uk/flexible-working",
            "<body><nav>menu</nav><main><p>You can ask to work from home.</p></main></body>",
        );
        let session = browser.launch().await.unwrap();
        let extractor = ContentExtractor::new(Duration::from_secs(5), 5000);

        let doc = extractor
            .extract(
                session.as_ref(),
                &candidate("https://www.gov.uk/flexible-working"),
                0,
            )
            .await;
        assert_eq!(doc.text, "You can ask to work from home.");
        assert_eq!(doc.title, "www.gov.uk");
    }

    #[tokio::test]
    async fn test_rendered_title_used_when_search_gave_none() {
        let browser = MockBrowser::new().with_page(
            "https://example.gov/leave",
            crate::testing::MockPage::titled("<body><p>Leave</p></body>", "Annual Leave Act"),
        );
        let session = browser.launch().await.unwrap();
        let extractor = ContentExtractor::new(Duration::from_secs(5), 5000);

        let doc = extractor
            .extract(session.as_ref(), &candidate("https://example.gov/leave"), 0)
            .await;
        assert_eq!(doc.title, "Annual Leave Act");
    }

    #[tokio::test]
    async fn test_failures_yield_empty_documents() {
        let browser = MockBrowser::new()
            .with_failure("https://a.gov/", "net::ERR_NAME_NOT_RESOLVED")
            .with_not_html("https://b.gov/act.pdf", "application/pdf")
            .with_html("https://c.gov/", "<body>   </body>");
        let session = browser.launch().await.unwrap();
        let extractor = ContentExtractor::new(Duration::from_secs(5), 5000);

        for (rank, url) in ["https://a.gov/", "https://b.gov/act.pdf", "https://c.gov/"]
            .iter()
            .enumerate()
        {
            let doc = extractor
                .extract(session.as_ref(), &candidate(url), rank)
                .await;
            assert!(!doc.has_text(), "{} should be empty", url);
            assert_eq!(doc.rank, rank);
        }
    }

    #[tokio::test]
    async fn test_timeout_is_bounded() {
        let browser = MockBrowser::new().with_hang("https://slow.gov/");
        let session = browser.launch().await.unwrap();
        let extractor = ContentExtractor::new(Duration::from_millis(100), 5000);

        let started = Instant::now();
        let doc = extractor
            .extract(session.as_ref(), &candidate("https://slow.gov/"), 0)
            .await;

        assert!(!doc.has_text());
        assert!(started.elapsed() < Duration::from_millis(1000));
        assert_eq!(browser.open_pages(), 0);
    }

    #[tokio::test]
    async fn test_extract_all_preserves_rank_order() {
        let browser = MockBrowser::new()
            .with_delayed_html("https://a.gov/", Duration::from_millis(150), "<p>A</p>")
            .with_delayed_html("https://b.gov/", Duration::from_millis(10), "<p>B</p>")
            .with_delayed_html("https://c.gov/", Duration::from_millis(80), "<p>C</p>");
        let session = browser.launch().await.unwrap();
        let extractor = ContentExtractor::new(Duration::from_secs(5), 5000).with_concurrency(3);
        let progress = RecordingProgress::new();

        let candidates = vec![
            candidate("https://a.gov/"),
            candidate("https://b.gov/"),
            candidate("https://c.gov/"),
        ];
        let docs = extractor
            .extract_all(session.as_ref(), &candidates, &progress)
            .await;

        let texts: Vec<_> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, ["A", "B", "C"]);
        assert_eq!(progress.extracted_indices(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let mut browser = MockBrowser::new();
        let mut candidates = Vec::new();
        for i in 0..6 {
            let url = format!("https://site{}.gov/", i);
            browser = browser.with_delayed_html(&url, Duration::from_millis(40), "<p>x</p>");
            candidates.push(candidate(&url));
        }
        let session = browser.launch().await.unwrap();
        let extractor = ContentExtractor::new(Duration::from_secs(5), 5000).with_concurrency(2);

        let docs = extractor
            .extract_all(session.as_ref(), &candidates, &NoopProgress)
            .await;

        assert_eq!(docs.len(), 6);
        assert!(browser.max_concurrent_pages() <= 2);
        assert_eq!(browser.open_pages(), 0);
    }
}
