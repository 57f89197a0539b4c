//! Source retrieval: one bounded search call plus URL screening.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{SearchError, SearchResult};
use crate::security::UrlValidator;
use crate::traits::searcher::WebSearcher;
use crate::types::candidate::SourceCandidate;

/// Runs the search and returns at most `max_results` candidates in service
/// order.
pub struct SourceRetriever {
    searcher: Arc<dyn WebSearcher>,
    validator: UrlValidator,
    max_results: usize,
    timeout: Duration,
}

impl SourceRetriever {
    pub fn new(searcher: Arc<dyn WebSearcher>, max_results: usize, timeout: Duration) -> Self {
        Self {
            searcher,
            validator: UrlValidator::new(),
            max_results,
            timeout,
        }
    }

    pub fn with_validator(mut self, validator: UrlValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Search once. Never retried, never reordered.
    pub async fn retrieve(&self, query: &str) -> SearchResult<Vec<SourceCandidate>> {
        let mut candidates = tokio::time::timeout(
            self.timeout,
            self.searcher.search(query, self.max_results),
        )
        .await
        .map_err(|_| SearchError::Timeout {
            secs: self.timeout.as_secs(),
        })??;

        candidates.truncate(self.max_results);

        let before = candidates.len();
        candidates.retain(|candidate| match self.validator.validate(candidate.url.as_str()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(url = %candidate.url, error = %e, "Dropping unsafe search result");
                false
            }
        });

        tracing::info!(
            searcher = self.searcher.name(),
            returned = before,
            kept = candidates.len(),
            "Search complete"
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSearcher;

    fn candidates(urls: &[&str]) -> Vec<SourceCandidate> {
        urls.iter()
            .filter_map(|u| SourceCandidate::from_url(u))
            .collect()
    }

    #[tokio::test]
    async fn test_truncates_without_reordering() {
        let searcher = MockSearcher::new().with_results(candidates(&[
            "https://a.gov/1",
            "https://b.gov/2",
            "https://c.gov/3",
            "https://d.gov/4",
        ]));
        let retriever = SourceRetriever::new(Arc::new(searcher), 3, Duration::from_secs(5));

        let found = retriever.retrieve("q").await.unwrap();
        let urls: Vec<_> = found.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, ["https://a.gov/1", "https://b.gov/2", "https://c.gov/3"]);
    }

    #[tokio::test]
    async fn test_passes_limit_to_searcher() {
        let searcher = Arc::new(MockSearcher::new());
        let retriever = SourceRetriever::new(searcher.clone(), 4, Duration::from_secs(5));
        retriever.retrieve("q").await.unwrap();
        assert_eq!(searcher.last_limit(), Some(4));
        assert_eq!(searcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_unsafe_urls_are_dropped() {
        let searcher = MockSearcher::new().with_results(candidates(&[
            "https://www.gov.uk/working-time",
            "http://169.254.169.254/latest/meta-data",
            "file:///etc/passwd",
            "https://www.legislation.gov.uk/uksi/1998/1833",
        ]));
        let retriever = SourceRetriever::new(Arc::new(searcher), 5, Duration::from_secs(5));

        let found = retriever.retrieve("q").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].host(), "www.legislation.gov.uk");
    }

    #[tokio::test]
    async fn test_errors_surface_unchanged() {
        let searcher =
            MockSearcher::new().with_error(|| SearchError::Auth("invalid API key".into()));
        let retriever = SourceRetriever::new(Arc::new(searcher), 5, Duration::from_secs(5));
        assert!(matches!(
            retriever.retrieve("q").await,
            Err(SearchError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_slow_search_times_out() {
        let searcher = MockSearcher::new().with_delay(Duration::from_secs(10));
        let retriever = SourceRetriever::new(Arc::new(searcher), 5, Duration::from_millis(50));
        assert!(matches!(
            retriever.retrieve("q").await,
            Err(SearchError::Timeout { .. })
        ));
    }
}
