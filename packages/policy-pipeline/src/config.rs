//! Pipeline configuration: credentials and tunables.
//!
//! Loaded once at startup (from the environment or built explicitly) and
//! passed into the pipeline. Components never read the environment
//! themselves.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::security::ApiKey;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Smallest accepted prompt budget; the instruction template must fit.
pub const MIN_PROMPT_CHARS: usize = 2_048;

/// Tavily rejects `max_results` above this.
pub const MAX_SEARCH_RESULTS: usize = 20;

/// What to do when no source yielded usable text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyContextPolicy {
    /// End the run with `EmptyContext`.
    #[default]
    Fail,
    /// Generate from the instruction template alone.
    InstructionsOnly,
}

impl FromStr for EmptyContextPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "instructions-only" | "instructions_only" => Ok(Self::InstructionsOnly),
            other => Err(format!(
                "expected 'fail' or 'instructions-only', got '{}'",
                other
            )),
        }
    }
}

/// Everything a run needs before it starts.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub tavily_api_key: ApiKey,
    pub gemini_api_key: ApiKey,
    pub gemini_model: String,

    /// Fan-out cap: most candidates requested from search and extracted.
    pub max_results: usize,
    /// Prompt budget in characters.
    pub max_prompt_chars: usize,
    /// Per-page text cap in characters.
    pub max_chars_per_page: usize,

    pub page_timeout: Duration,
    pub search_timeout: Duration,
    pub generation_timeout: Duration,

    /// Concurrent browser pages during extraction.
    pub extraction_concurrency: usize,
    /// Optional page-load throttle.
    pub pages_per_second: Option<NonZeroU32>,

    pub empty_context: EmptyContextPolicy,
    /// Restrict search to these domains (empty = unrestricted).
    pub include_domains: Vec<String>,
    /// Explicit browser binary; probed paths are used when unset.
    pub chrome_bin: Option<PathBuf>,

    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl PipelineConfig {
    /// Config with default tunables.
    pub fn new(tavily_api_key: impl Into<String>, gemini_api_key: impl Into<String>) -> Self {
        Self {
            tavily_api_key: ApiKey::new("tavily", tavily_api_key.into()),
            gemini_api_key: ApiKey::new("gemini", gemini_api_key.into()),
            gemini_model: DEFAULT_MODEL.to_string(),
            max_results: 5,
            max_prompt_chars: 60_000,
            max_chars_per_page: 5_000,
            page_timeout: Duration::from_secs(30),
            search_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(120),
            extraction_concurrency: 3,
            pages_per_second: None,
            empty_context: EmptyContextPolicy::Fail,
            include_domains: Vec::new(),
            chrome_bin: None,
            temperature: 0.4,
            max_output_tokens: 8_192,
        }
    }

    /// Load from process environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tavily = get("TAVILY_API_KEY")
            .ok_or_else(|| PipelineError::config("TAVILY_API_KEY", "not set"))?;
        let gemini = get("GEMINI_API_KEY")
            .ok_or_else(|| PipelineError::config("GEMINI_API_KEY", "not set"))?;

        let mut config = Self::new(tavily, gemini);

        if let Some(model) = get("GEMINI_MODEL") {
            config.gemini_model = model.trim().to_string();
        }
        if let Some(v) = get("POLICY_MAX_RESULTS") {
            config.max_results = parse_var("POLICY_MAX_RESULTS", &v)?;
        }
        if let Some(v) = get("POLICY_MAX_PROMPT_CHARS") {
            config.max_prompt_chars = parse_var("POLICY_MAX_PROMPT_CHARS", &v)?;
        }
        if let Some(v) = get("POLICY_MAX_CHARS_PER_PAGE") {
            config.max_chars_per_page = parse_var("POLICY_MAX_CHARS_PER_PAGE", &v)?;
        }
        if let Some(v) = get("POLICY_PAGE_TIMEOUT_SECS") {
            config.page_timeout = parse_secs("POLICY_PAGE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("POLICY_SEARCH_TIMEOUT_SECS") {
            config.search_timeout = parse_secs("POLICY_SEARCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("POLICY_GENERATION_TIMEOUT_SECS") {
            config.generation_timeout = parse_secs("POLICY_GENERATION_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("POLICY_EXTRACTION_CONCURRENCY") {
            config.extraction_concurrency = parse_var("POLICY_EXTRACTION_CONCURRENCY", &v)?;
        }
        if let Some(v) = get("POLICY_PAGES_PER_SECOND") {
            config.pages_per_second = Some(parse_var("POLICY_PAGES_PER_SECOND", &v)?);
        }
        if let Some(v) = get("POLICY_EMPTY_CONTEXT") {
            config.empty_context = parse_var("POLICY_EMPTY_CONTEXT", &v)?;
        }
        if let Some(v) = get("POLICY_INCLUDE_DOMAINS") {
            config.include_domains = v
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = get("CHROME_BIN") {
            config.chrome_bin = Some(PathBuf::from(v.trim()));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.gemini_model = model.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    pub fn with_max_chars_per_page(mut self, max_chars: usize) -> Self {
        self.max_chars_per_page = max_chars;
        self
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_extraction_concurrency(mut self, concurrency: usize) -> Self {
        self.extraction_concurrency = concurrency;
        self
    }

    pub fn with_pages_per_second(mut self, pages_per_second: NonZeroU32) -> Self {
        self.pages_per_second = Some(pages_per_second);
        self
    }

    pub fn with_empty_context(mut self, policy: EmptyContextPolicy) -> Self {
        self.empty_context = policy;
        self
    }

    pub fn with_include_domains(
        mut self,
        domains: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.include_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_chrome_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_bin = Some(path.into());
        self
    }

    /// Check credentials and tunables; fails with `ConfigurationMissing`.
    pub fn validate(&self) -> Result<()> {
        if self.tavily_api_key.is_blank() {
            return Err(PipelineError::config("TAVILY_API_KEY", "empty"));
        }
        if self.gemini_api_key.is_blank() {
            return Err(PipelineError::config("GEMINI_API_KEY", "empty"));
        }
        if self.gemini_model.trim().is_empty() {
            return Err(PipelineError::config("GEMINI_MODEL", "empty"));
        }
        if !(1..=MAX_SEARCH_RESULTS).contains(&self.max_results) {
            return Err(PipelineError::config(
                "POLICY_MAX_RESULTS",
                format!("must be between 1 and {}", MAX_SEARCH_RESULTS),
            ));
        }
        if self.max_prompt_chars < MIN_PROMPT_CHARS {
            return Err(PipelineError::config(
                "POLICY_MAX_PROMPT_CHARS",
                format!("must be at least {}", MIN_PROMPT_CHARS),
            ));
        }
        if self.max_chars_per_page == 0 {
            return Err(PipelineError::config("POLICY_MAX_CHARS_PER_PAGE", "must be positive"));
        }
        if self.extraction_concurrency == 0 {
            return Err(PipelineError::config(
                "POLICY_EXTRACTION_CONCURRENCY",
                "must be positive",
            ));
        }
        for (key, timeout) in [
            ("POLICY_PAGE_TIMEOUT_SECS", self.page_timeout),
            ("POLICY_SEARCH_TIMEOUT_SECS", self.search_timeout),
            ("POLICY_GENERATION_TIMEOUT_SECS", self.generation_timeout),
        ] {
            if timeout.is_zero() {
                return Err(PipelineError::config(key, "must be positive"));
            }
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(PipelineError::config("temperature", "must be between 0.0 and 2.0"));
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| PipelineError::config(key, format!("invalid value '{}': {}", value, e)))
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    parse_var::<u64>(key, value).map(Duration::from_secs)
}
