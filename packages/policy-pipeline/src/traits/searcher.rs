//! Web searcher trait for source discovery.
//!
//! Abstracts over search providers (Tavily today). The pipeline asks for a
//! bounded number of ranked results and treats their order as the ranking.

use async_trait::async_trait;

use crate::error::SearchResult;
use crate::types::candidate::SourceCandidate;

/// Web search for candidate sources.
///
/// # Implementations
///
/// - `TavilySearcher` - Tavily API
/// - `MockSearcher` - For testing
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web for pages relevant to the query.
    ///
    /// Returns at most `limit` results in the provider's ranking order.
    async fn search(&self, query: &str, limit: usize) -> SearchResult<Vec<SourceCandidate>>;

    /// Provider name for logs.
    fn name(&self) -> &str {
        "web"
    }
}
