//! Chromium driver over the DevTools protocol (`chromiumoxide`).
//!
//! One browser process per run, one page per render. Pages are closed
//! explicitly on the normal path and by a drop guard when the render future
//! is cancelled or times out. `shutdown()` asks the browser to close, waits a
//! bounded time for the process to exit and kills it otherwise. If the
//! session is dropped without it, the handler task is aborted and
//! `chromiumoxide` kills the child process.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::{Stream, StreamExt};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::error::{RenderError, RenderResult};
use crate::traits::browser::{BrowserLauncher, BrowserSession, RenderedPage};

/// Desktop Chrome user agent; some government sites refuse headless UAs.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const CANDIDATE_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/snap/chromium/current/usr/lib/chromium-browser/chrome",
    "/snap/chromium/stable/usr/lib/chromium-browser/chrome",
];

const PATH_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Consecutive handler errors tolerated before the event loop gives up.
const MAX_CONSECUTIVE_HANDLER_ERRORS: usize = 32;

const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-software-rasterizer",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--disable-features=TranslateUI",
    "--disable-blink-features=AutomationControlled",
    "--disable-extensions",
    "--blink-settings=imagesEnabled=false",
    "--window-size=1920,1080",
];

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Locate a Chrome/Chromium binary.
///
/// An explicit path wins; otherwise well-known install locations are
/// checked, then `PATH`.
pub fn find_chrome_binary(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return is_executable(path).then(|| path.to_path_buf());
    }

    if let Some(found) = CANDIDATE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| is_executable(p))
    {
        return Some(found);
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| PATH_NAMES.iter().map(move |name| dir.join(name)))
        .find(|p| is_executable(p))
}

/// Launches headless Chromium.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    chrome_bin: Option<PathBuf>,
    user_agent: String,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

impl Default for ChromeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeLauncher {
    pub fn new() -> Self {
        Self {
            chrome_bin: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(5),
        }
    }

    /// Use this binary instead of probing install locations.
    pub fn with_chrome_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_bin = Some(path.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// DevTools request timeout (per CDP command, not per page).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Bound on each teardown step (close, wait for exit, kill).
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    fn args(&self) -> Vec<String> {
        LAUNCH_ARGS
            .iter()
            .map(|a| a.to_string())
            .chain(std::iter::once(format!("--user-agent={}", self.user_agent)))
            .collect()
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    fn probe(&self) -> RenderResult<PathBuf> {
        find_chrome_binary(self.chrome_bin.as_deref()).ok_or_else(|| match &self.chrome_bin {
            Some(path) => RenderError::Unavailable(format!(
                "CHROME_BIN points to {} which is not an executable file",
                path.display()
            )),
            None => RenderError::Unavailable(
                "no Chrome or Chromium binary found in standard locations or PATH".to_string(),
            ),
        })
    }

    async fn launch(&self) -> RenderResult<Box<dyn BrowserSession>> {
        let bin = self.probe()?;

        tracing::info!(bin = %bin.display(), "Launching headless Chromium");

        let config = BrowserConfig::builder()
            .chrome_executable(&bin)
            .request_timeout(self.request_timeout)
            .args(self.args())
            .build()
            .map_err(RenderError::Unavailable)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Unavailable(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            let events = drive_events(&mut handler).await;
            tracing::debug!(events, "Chromium event loop exited");
        });

        Ok(Box::new(ChromeSession {
            browser: AsyncMutex::new(Some(browser)),
            handler: Mutex::new(Some(handler_task)),
            shutdown_timeout: self.shutdown_timeout,
        }))
    }
}

/// A running Chromium process.
pub struct ChromeSession {
    browser: AsyncMutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
}

impl ChromeSession {
    fn abort_handler(&self) {
        if let Ok(mut handler) = self.handler.lock() {
            if let Some(task) = handler.take() {
                task.abort();
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn render(&self, url: &str) -> RenderResult<RenderedPage> {
        let page = {
            let guard = self.browser.lock().await;
            let browser = guard
                .as_ref()
                .ok_or_else(|| RenderError::Crashed("browser already shut down".to_string()))?;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| classify_error(url, e))?
        };

        let page = PageGuard::new(page);
        let result = load(page.page(), url).await;
        page.close().await;
        result
    }

    async fn shutdown(&self) {
        let browser = self.browser.lock().await.take();
        if let Some(mut browser) = browser {
            let outcome = teardown(&mut browser, self.shutdown_timeout).await;
            tracing::debug!(?outcome, "Chromium shut down");
        }
        self.abort_handler();
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Dropping the Browser kills the child; the handler would otherwise
        // spin until the socket closes.
        self.abort_handler();
    }
}

/// Pump CDP events until the connection ends.
///
/// A single unparseable message must not stop the loop, or every later page
/// in the run would fail; a long run of errors means the socket is gone.
/// Returns the number of events seen.
async fn drive_events<S, E>(events: &mut S) -> usize
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: std::fmt::Display,
{
    let mut seen = 0;
    let mut consecutive_errors = 0;

    while let Some(event) = events.next().await {
        seen += 1;
        match event {
            Ok(()) => consecutive_errors = 0,
            Err(e) => {
                consecutive_errors += 1;
                tracing::debug!(error = %e, consecutive_errors, "Chromium handler error");
                if consecutive_errors >= MAX_CONSECUTIVE_HANDLER_ERRORS {
                    tracing::warn!("Chromium event loop failing repeatedly, stopping");
                    break;
                }
            }
        }
    }

    seen
}

/// The teardown operations of a browser process.
#[async_trait]
trait BrowserProcess: Send {
    async fn request_close(&mut self) -> Result<(), String>;
    async fn wait_exit(&mut self) -> Result<(), String>;
    async fn force_kill(&mut self) -> Result<(), String>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<(), String> {
        self.close().await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn wait_exit(&mut self) -> Result<(), String> {
        self.wait().await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn force_kill(&mut self) -> Result<(), String> {
        match self.kill().await {
            Some(Err(e)) => Err(e.to_string()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    /// Closed on request and exited.
    Exited,
    /// Close failed or stalled; the process was killed.
    Killed,
}

/// Close, wait for exit, kill on failure. Every step is bounded by `limit`.
async fn teardown<P: BrowserProcess + ?Sized>(process: &mut P, limit: Duration) -> Teardown {
    let closed = match tokio::time::timeout(limit, process.request_close()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Browser close failed");
            false
        }
        Err(_) => {
            tracing::debug!(limit_ms = limit.as_millis() as u64, "Browser close timed out");
            false
        }
    };

    if closed {
        match tokio::time::timeout(limit, process.wait_exit()).await {
            Ok(Ok(())) => return Teardown::Exited,
            Ok(Err(e)) => tracing::debug!(error = %e, "Waiting for browser exit failed"),
            Err(_) => tracing::debug!("Browser did not exit after close"),
        }
    }

    match tokio::time::timeout(limit, process.force_kill()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Killing browser failed"),
        Err(_) => tracing::warn!("Killing browser timed out"),
    }
    Teardown::Killed
}

/// Closes the page even when the render future is dropped.
struct PageGuard {
    page: Page,
    closed: bool,
}

impl PageGuard {
    fn new(page: Page) -> Self {
        Self {
            page,
            closed: false,
        }
    }

    fn page(&self) -> &Page {
        &self.page
    }

    async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!(error = %e, "Page close failed");
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}

async fn load(page: &Page, url: &str) -> RenderResult<RenderedPage> {
    page.goto(url).await.map_err(|e| classify_error(url, e))?;

    let content_type: String = page
        .evaluate("document.contentType")
        .await
        .map_err(|e| classify_error(url, e))?
        .into_value()
        .unwrap_or_default();

    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| url.to_string());

    let rendered = RenderedPage {
        url: final_url,
        html: String::new(),
        content_type,
        title: None,
    };
    if !rendered.is_html() {
        return Err(RenderError::NotHtml {
            url: url.to_string(),
            content_type: rendered.content_type,
        });
    }

    let html = page.content().await.map_err(|e| classify_error(url, e))?;
    let title = page.get_title().await.ok().flatten();

    Ok(RenderedPage {
        html,
        title,
        ..rendered
    })
}

/// Tell a dead browser apart from a page that failed to load.
fn classify_error(url: &str, error: impl std::fmt::Display) -> RenderError {
    let details = error.to_string();
    let lower = details.to_ascii_lowercase();
    if lower.contains("receiver is gone")
        || lower.contains("channel closed")
        || lower.contains("connection reset")
        || lower.contains("broken pipe")
    {
        RenderError::Crashed(details)
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            details,
        }
    }
}
