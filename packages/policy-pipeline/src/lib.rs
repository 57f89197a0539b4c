//! Country-Specific HR Policy Drafting Pipeline
//!
//! Turns a (country, policy type) request into a draft HR policy grounded in
//! official sources: search for government and legislation pages, render
//! them in a headless browser, reduce them to text, and hand a bounded
//! prompt to a generation model.
//!
//! # Design Philosophy
//!
//! - One forward-only run per request, no persistence
//! - Per-page failures degrade the context, they never end the run
//! - External services sit behind traits, so every stage is testable
//! - Credentials are loaded once and passed in explicitly
//!
//! # Usage
//!
//! ```rust,ignore
//! use policy_pipeline::{PipelineConfig, PolicyPipeline, PolicyRequest};
//!
//! let config = PipelineConfig::from_env()?;
//! let pipeline = PolicyPipeline::from_config(&config)?;
//!
//! let request = PolicyRequest::new("Germany", "Remote Work Policy")?;
//! let policy = pipeline.run(&request).await?;
//!
//! for section in policy.sections() {
//!     println!("{}", section.heading);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Service seams (WebSearcher, BrowserLauncher, TextGenerator, ProgressReporter)
//! - [`types`] - Request, candidate, document and policy types
//! - [`pipeline`] - Stages and the run that orchestrates them
//! - [`search`] - Tavily search
//! - [`browser`] - Headless Chromium
//! - [`ai`] - Gemini generation
//! - [`config`] - Environment-driven configuration
//! - [`security`] - Credential handling and SSRF protection
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod browser;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod search;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::{EmptyContextPolicy, PipelineConfig, DEFAULT_MODEL};
pub use error::{
    ErrorKind, GenerationError, PipelineError, RenderError, Result, SearchError, SecurityError,
};
pub use traits::{
    browser::{BrowserLauncher, BrowserSession, RenderedPage},
    generator::{GenerationParams, TextGenerator},
    progress::{NoopProgress, ProgressReporter},
    searcher::WebSearcher,
};
pub use types::{
    candidate::SourceCandidate,
    document::ExtractedDocument,
    policy::{PolicyDocument, PolicySection},
    prompt::GenerationPrompt,
    request::PolicyRequest,
    stage::{PipelineStage, StageOutcome, StageReport},
};

// Re-export pipeline components
pub use pipeline::{
    formulate, html_to_text, query_for, ContentExtractor, GenerationClient, PolicyPipeline,
    PolicyPipelineBuilder, PromptAssembler, SourceRetriever,
};

// Re-export service implementations
pub use ai::GeminiGenerator;
pub use browser::ChromeLauncher;
pub use search::TavilySearcher;
pub use security::{ApiKey, UrlValidator};

// Cancellation is part of the run API
pub use tokio_util::sync::CancellationToken;
