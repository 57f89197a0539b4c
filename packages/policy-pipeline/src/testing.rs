//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the policy pipeline
//! without making real search, browser, or LLM calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::error::{GenerationError, GenerationResult, RenderError, RenderResult, SearchError, SearchResult};
use crate::traits::browser::{BrowserLauncher, BrowserSession, RenderedPage};
use crate::traits::generator::{GenerationParams, TextGenerator};
use crate::traits::progress::ProgressReporter;
use crate::traits::searcher::WebSearcher;
use crate::types::candidate::SourceCandidate;
use crate::types::document::ExtractedDocument;
use crate::types::stage::{PipelineStage, StageReport};

type ErrorFactory<E> = Box<dyn Fn() -> E + Send + Sync>;

// =============================================================================
// Search
// =============================================================================

/// A mock web searcher returning fixed results.
#[derive(Default)]
pub struct MockSearcher {
    results: Vec<SourceCandidate>,
    error: Option<ErrorFactory<SearchError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_limit: Mutex<Option<usize>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, results: Vec<SourceCandidate>) -> Self {
        self.results = results;
        self
    }

    /// Add URL strings as results (unparseable URLs are ignored).
    pub fn with_urls(self, urls: &[&str]) -> Self {
        let results = urls
            .iter()
            .filter_map(|u| SourceCandidate::from_url(u))
            .collect();
        self.with_results(results)
    }

    /// Fail every search with the error produced by `error`.
    pub fn with_error<F>(mut self, error: F) -> Self
    where
        F: Fn() -> SearchError + Send + Sync + 'static,
    {
        self.error = Some(Box::new(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_limit(&self) -> Option<usize> {
        *self.last_limit.lock().unwrap()
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, _query: &str, limit: usize) -> SearchResult<Vec<SourceCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = Some(limit);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.error {
            return Err(error());
        }
        Ok(self.results.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Browser
// =============================================================================

/// Scripted behaviour for one URL.
#[derive(Debug, Clone)]
pub enum MockPage {
    Html {
        html: String,
        title: Option<String>,
        delay: Option<Duration>,
    },
    Fail(String),
    NotHtml(String),
    /// Never finishes loading.
    Hang,
}

impl MockPage {
    pub fn html(html: impl Into<String>) -> Self {
        Self::Html {
            html: html.into(),
            title: None,
            delay: None,
        }
    }

    pub fn titled(html: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Html {
            html: html.into(),
            title: Some(title.into()),
            delay: None,
        }
    }

    pub fn delayed(html: impl Into<String>, delay: Duration) -> Self {
        Self::Html {
            html: html.into(),
            title: None,
            delay: Some(delay),
        }
    }
}

#[derive(Default)]
struct BrowserState {
    pages: RwLock<HashMap<String, MockPage>>,
    fail_launch: RwLock<Option<String>>,
    launches: AtomicUsize,
    renders: AtomicUsize,
    open_pages: AtomicUsize,
    max_concurrent: AtomicUsize,
    shutdowns: AtomicUsize,
}

/// A mock browser launcher and its sessions.
///
/// Cloning shares state, so a test can keep a handle for assertions after
/// handing the launcher to a pipeline.
#[derive(Clone, Default)]
pub struct MockBrowser {
    state: Arc<BrowserState>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, page: MockPage) -> Self {
        self.state.pages.write().unwrap().insert(url.into(), page);
        self
    }

    pub fn with_html(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_page(url, MockPage::html(html))
    }

    pub fn with_delayed_html(
        self,
        url: impl Into<String>,
        delay: Duration,
        html: impl Into<String>,
    ) -> Self {
        self.with_page(url, MockPage::delayed(html, delay))
    }

    pub fn with_failure(self, url: impl Into<String>, details: impl Into<String>) -> Self {
        self.with_page(url, MockPage::Fail(details.into()))
    }

    pub fn with_not_html(self, url: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.with_page(url, MockPage::NotHtml(content_type.into()))
    }

    pub fn with_hang(self, url: impl Into<String>) -> Self {
        self.with_page(url, MockPage::Hang)
    }

    /// Make `probe` and `launch` fail as if no browser were installed.
    pub fn unavailable(self, reason: impl Into<String>) -> Self {
        *self.state.fail_launch.write().unwrap() = Some(reason.into());
        self
    }

    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    pub fn renders(&self) -> usize {
        self.state.renders.load(Ordering::SeqCst)
    }

    /// Pages currently open (should be 0 once a run ends).
    pub fn open_pages(&self) -> usize {
        self.state.open_pages.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_pages(&self) -> usize {
        self.state.max_concurrent.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.state.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for MockBrowser {
    fn probe(&self) -> RenderResult<PathBuf> {
        match self.state.fail_launch.read().unwrap().as_ref() {
            Some(reason) => Err(RenderError::Unavailable(reason.clone())),
            None => Ok(PathBuf::from("/usr/bin/mock-chromium")),
        }
    }

    async fn launch(&self) -> RenderResult<Box<dyn BrowserSession>> {
        self.probe()?;
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: self.state.clone(),
        }))
    }
}

struct MockSession {
    state: Arc<BrowserState>,
}

/// Counts a page as open until dropped, including when the render future
/// is cancelled.
struct OpenPage<'a> {
    state: &'a BrowserState,
}

impl<'a> OpenPage<'a> {
    fn open(state: &'a BrowserState) -> Self {
        let open = state.open_pages.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_concurrent.fetch_max(open, Ordering::SeqCst);
        Self { state }
    }
}

impl Drop for OpenPage<'_> {
    fn drop(&mut self) {
        self.state.open_pages.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn render(&self, url: &str) -> RenderResult<RenderedPage> {
        self.state.renders.fetch_add(1, Ordering::SeqCst);
        let _page = OpenPage::open(&self.state);

        let scripted = self.state.pages.read().unwrap().get(url).cloned();
        match scripted {
            Some(MockPage::Html { html, title, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(RenderedPage {
                    title,
                    ..RenderedPage::html(url, html)
                })
            }
            Some(MockPage::Fail(details)) => Err(RenderError::Navigation {
                url: url.to_string(),
                details,
            }),
            Some(MockPage::NotHtml(content_type)) => Err(RenderError::NotHtml {
                url: url.to_string(),
                content_type,
            }),
            Some(MockPage::Hang) => std::future::pending().await,
            None => Err(RenderError::Navigation {
                url: url.to_string(),
                details: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn shutdown(&self) {
        self.state.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Generation
// =============================================================================

/// A mock text generator.
#[derive(Default)]
pub struct MockGenerator {
    response: String,
    error: Option<ErrorFactory<GenerationError>>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    pub fn with_error<F>(mut self, error: F) -> Self
    where
        F: Fn() -> GenerationError + Send + Sync + 'static,
    {
        self.error = Some(Box::new(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> GenerationResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.error {
            return Err(error());
        }
        Ok(self.response.clone())
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

// =============================================================================
// Progress
// =============================================================================

/// Record of a progress callback.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    StageStarted(PipelineStage),
    StageCompleted { stage: PipelineStage, summary: String },
    SourceExtracted { index: usize, total: usize, has_text: bool },
}

/// Progress reporter that records every callback.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn started_stages(&self) -> Vec<PipelineStage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::StageStarted(stage) => Some(stage),
                _ => None,
            })
            .collect()
    }

    pub fn completed_stages(&self) -> Vec<PipelineStage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::StageCompleted { stage, .. } => Some(stage),
                _ => None,
            })
            .collect()
    }

    pub fn extracted_indices(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::SourceExtracted { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressReporter for RecordingProgress {
    fn stage_started(&self, stage: PipelineStage) {
        self.push(ProgressEvent::StageStarted(stage));
    }

    fn stage_completed(&self, report: &StageReport) {
        self.push(ProgressEvent::StageCompleted {
            stage: report.stage(),
            summary: report.outcome.summary(),
        });
    }

    fn source_extracted(&self, index: usize, total: usize, document: &ExtractedDocument) {
        self.push(ProgressEvent::SourceExtracted {
            index,
            total,
            has_text: document.has_text(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_searcher_records_limit() {
        let searcher = MockSearcher::new().with_urls(&["https://a.gov/", "https://b.gov/"]);
        let results = searcher.search("q", 7).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(searcher.last_limit(), Some(7));
    }

    #[tokio::test]
    async fn test_mock_browser_counts_pages() {
        let browser = MockBrowser::new().with_html("https://a.gov/", "<p>a</p>");
        let session = browser.launch().await.unwrap();
        let page = session.render("https://a.gov/").await.unwrap();
        assert_eq!(page.html, "<p>a</p>");
        assert_eq!(browser.renders(), 1);
        assert_eq!(browser.open_pages(), 0);
        assert!(session.render("https://unknown.gov/").await.is_err());
    }

    #[tokio::test]
    async fn test_unavailable_browser() {
        let browser = MockBrowser::new().unavailable("no chromium");
        assert!(browser.probe().is_err());
        assert!(browser.launch().await.is_err());
        assert_eq!(browser.launches(), 0);
    }
}
