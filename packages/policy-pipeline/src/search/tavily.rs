//! Tavily-backed web searcher.
//!
//! One `POST /search` per run with bearer auth and `search_depth:
//! "advanced"`. Errors are classified (auth, quota, transport, parse) and
//! never retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{SearchError, SearchResult};
use crate::security::ApiKey;
use crate::traits::searcher::WebSearcher;
use crate::types::candidate::SourceCandidate;

/// Default Tavily endpoint.
pub const TAVILY_API_URL: &str = "https://api.tavily.com";

/// Tavily search request.
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_domains: Option<&'a [String]>,
}

/// Tavily search response.
#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

/// A single Tavily search result.
#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    score: Option<f32>,
}

/// Searcher that uses Tavily to discover official sources.
pub struct TavilySearcher {
    client: reqwest::Client,
    api_key: ApiKey,
    base_url: String,
    search_depth: String,
    include_domains: Vec<String>,
    timeout: Option<Duration>,
}

impl TavilySearcher {
    /// Create a new Tavily searcher.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: TAVILY_API_URL.to_string(),
            search_depth: "advanced".to_string(),
            include_domains: Vec::new(),
            timeout: None,
        }
    }

    /// Set the HTTP client timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> SearchResult<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Http(Box::new(e)))?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set search depth ("basic" or "advanced").
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    fn transport_error(&self, e: reqwest::Error) -> SearchError {
        match self.timeout {
            Some(timeout) if e.is_timeout() => SearchError::Timeout {
                secs: timeout.as_secs(),
            },
            _ => SearchError::Http(Box::new(e)),
        }
    }

    /// Restrict results to these domains.
    pub fn with_include_domains(mut self, domains: Vec<String>) -> Self {
        self.include_domains = domains;
        self
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str, limit: usize) -> SearchResult<Vec<SourceCandidate>> {
        let request = TavilyRequest {
            query,
            search_depth: &self.search_depth,
            max_results: limit,
            include_domains: (!self.include_domains.is_empty())
                .then_some(self.include_domains.as_slice()),
        };

        tracing::debug!(query = %query, limit, depth = %self.search_depth, "Tavily search");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("Content-Type", "application/json")
            .header("Authorization", self.api_key.bearer())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !(200..300).contains(&status) {
            return Err(error_for_status(status, &body));
        }

        parse_response(&body, limit)
    }

    fn name(&self) -> &str {
        "tavily"
    }
}


/// Classify a non-2xx Tavily response.
fn error_for_status(status: u16, body: &str) -> SearchError {
    let message = error_message(body);
    match status {
        401 | 403 => SearchError::Auth(message),
        // 432: plan limit, 433: pay-as-you-go limit
        429 | 432 | 433 => SearchError::Quota(message),
        _ => SearchError::Status {
            status,
            body: message,
        },
    }
}

/// Pull the human-readable message out of `{"detail": {"error": ...}}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let detail = v.get("detail")?;
            detail
                .get("error")
                .and_then(|e| e.as_str())
                .or_else(|| detail.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Decode results, skipping unparseable URLs and truncating to `limit`.
fn parse_response(body: &str, limit: usize) -> SearchResult<Vec<SourceCandidate>> {
    let response: TavilyResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;

    let candidates = response
        .results
        .into_iter()
        .filter_map(|r| {
            let url = match Url::parse(r.url.trim()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(url = %r.url, error = %e, "Skipping unparseable result URL");
                    return None;
                }
            };
            let mut candidate = SourceCandidate::new(url);
            if let Some(title) = r.title {
                candidate = candidate.with_title(title);
            }
            if let Some(content) = r.content {
                candidate = candidate.with_snippet(content);
            }
            if let Some(score) = r.score {
                candidate = candidate.with_score(score);
            }
            Some(candidate)
        })
        .take(limit)
        .collect();

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "query": "Remote Work Policy Germany",
        "results": [
            {"url": "https://www.bmas.de/telearbeit", "title": "Telearbeit", "content": "Mobile work rules", "score": 0.93},
            {"url": "not a url", "title": "Broken"},
            {"url": "https://www.gesetze-im-internet.de/arbstaettv/", "title": "ArbStättV", "score": 0.81},
            {"url": "https://www.bundesregierung.de/homeoffice"}
        ],
        "response_time": 1.2
    }"#;

    #[test]
    fn test_parse_skips_bad_urls_and_keeps_order() {
        let candidates = parse_response(BODY, 10).unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].url.as_str(), "https://www.bmas.de/telearbeit");
        assert_eq!(candidates[0].snippet, "Mobile work rules");
        assert_eq!(candidates[1].title, "ArbStättV");
        assert_eq!(candidates[2].title, "");
        assert_eq!(candidates[2].score, None);
    }

    #[test]
    fn test_parse_truncates_to_limit() {
        let candidates = parse_response(BODY, 2).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].host(), "www.gesetze-im-internet.de");
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(
            parse_response("<html>gateway</html>", 5),
            Err(SearchError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_results_is_empty() {
        assert!(parse_response("{}", 5).unwrap().is_empty());
    }

    #[test]
    fn test_status_classification() {
        let body = r#"{"detail": {"error": "Unauthorized: missing or invalid API key."}}"#;
        match error_for_status(401, body) {
            SearchError::Auth(msg) => assert!(msg.contains("invalid API key")),
            other => panic!("expected Auth, got {:?}", other),
        }
        assert!(matches!(error_for_status(403, ""), SearchError::Auth(_)));
        assert!(matches!(error_for_status(429, ""), SearchError::Quota(_)));
        assert!(matches!(error_for_status(432, ""), SearchError::Quota(_)));
        assert!(matches!(error_for_status(433, ""), SearchError::Quota(_)));
        assert!(matches!(
            error_for_status(500, "oops"),
            SearchError::Status { status: 500, .. }
        ));
    }

    #[test]
    fn test_request_omits_empty_domains() {
        let request = TavilyRequest {
            query: "q",
            search_depth: "advanced",
            max_results: 5,
            include_domains: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("include_domains").is_none());
        assert_eq!(json["search_depth"], "advanced");
    }

    #[test]
    fn test_unreachable_host_is_http_error() {
        let searcher = TavilySearcher::new(ApiKey::new("tavily", "tvly-test"))
            .with_base_url("http://127.0.0.1:9");
        let result = tokio_test::block_on(searcher.search("q", 5));
        assert!(matches!(result, Err(SearchError::Http(_))));
    }
}
