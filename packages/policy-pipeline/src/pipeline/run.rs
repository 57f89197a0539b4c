//! The end-to-end run: formulate, retrieve, extract, assemble, generate.

use std::future::Future;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::ai::GeminiGenerator;
use crate::browser::ChromeLauncher;
use crate::config::{EmptyContextPolicy, PipelineConfig, MAX_SEARCH_RESULTS, MIN_PROMPT_CHARS};
use crate::error::{PipelineError, Result};
use crate::pipeline::assemble::PromptAssembler;
use crate::pipeline::extract::ContentExtractor;
use crate::pipeline::generate::GenerationClient;
use crate::pipeline::query::query_for;
use crate::pipeline::retrieve::SourceRetriever;
use crate::search::TavilySearcher;
use crate::security::UrlValidator;
use crate::traits::browser::BrowserLauncher;
use crate::traits::generator::{GenerationParams, TextGenerator};
use crate::traits::progress::{NoopProgress, ProgressReporter};
use crate::traits::searcher::WebSearcher;
use crate::types::policy::PolicyDocument;
use crate::types::request::PolicyRequest;
use crate::types::stage::{PipelineStage, StageOutcome, StageReport};

/// A configured pipeline. Cheap to share; every run is independent.
pub struct PolicyPipeline {
    retriever: SourceRetriever,
    launcher: Arc<dyn BrowserLauncher>,
    extractor: ContentExtractor,
    assembler: PromptAssembler,
    generation: GenerationClient,
}

impl PolicyPipeline {
    /// Start building a pipeline from its three external services.
    pub fn builder(
        searcher: Arc<dyn WebSearcher>,
        launcher: Arc<dyn BrowserLauncher>,
        generator: Arc<dyn TextGenerator>,
    ) -> PolicyPipelineBuilder {
        PolicyPipelineBuilder::new(searcher, launcher, generator)
    }

    /// Production pipeline: Tavily, headless Chromium and Gemini.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        let searcher = TavilySearcher::new(config.tavily_api_key.clone())
            .with_include_domains(config.include_domains.clone())
            .with_timeout(config.search_timeout)
            .map_err(|e| PipelineError::config("TAVILY_API_KEY", e.to_string()))?;

        let mut launcher = ChromeLauncher::new().with_request_timeout(config.page_timeout);
        if let Some(bin) = &config.chrome_bin {
            launcher = launcher.with_chrome_bin(bin);
        }

        let generator = GeminiGenerator::new(config.gemini_api_key.clone())
            .with_model(config.gemini_model.clone())
            .with_timeout(config.generation_timeout)
            .map_err(|e| PipelineError::config("GEMINI_API_KEY", e.to_string()))?;

        PolicyPipelineBuilder::new(Arc::new(searcher), Arc::new(launcher), Arc::new(generator))
            .with_config(config)
            .build()
    }

    /// Check that a browser is available without starting it.
    pub fn check_environment(&self) -> Result<PathBuf> {
        Ok(self.launcher.probe()?)
    }

    /// Run without progress reporting or cancellation.
    pub async fn run(&self, request: &PolicyRequest) -> Result<PolicyDocument> {
        self.run_with(request, &NoopProgress, CancellationToken::new())
            .await
    }

    /// Run with progress callbacks; cancelling `cancel` ends the run with
    /// `Cancelled` after closing the browser.
    pub async fn run_with(
        &self,
        request: &PolicyRequest,
        progress: &dyn ProgressReporter,
        cancel: CancellationToken,
    ) -> Result<PolicyDocument> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "run",
            %run_id,
            policy_type = %request.policy_type(),
            location = %request.location(),
        );

        async move {
            let started = Instant::now();
            let mut clock = StageClock::start(progress);
            let result = self.execute(request, &mut clock, &cancel).await;

            match &result {
                Ok(policy) => tracing::info!(
                    chars = policy.content.chars().count(),
                    sources = policy.sources.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Run completed"
                ),
                Err(e) => tracing::warn!(
                    stage = %clock.current(),
                    kind = ?e.kind(),
                    error = %e,
                    "Run failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        request: &PolicyRequest,
        clock: &mut StageClock<'_>,
        cancel: &CancellationToken,
    ) -> Result<PolicyDocument> {
        // Formulating
        let query = query_for(request);
        self.launcher.probe()?;
        clock.complete(StageOutcome::Formulated {
            query: query.clone(),
        });

        // Retrieving
        clock.advance();
        let candidates = cancellable(cancel, clock.current(), self.retriever.retrieve(&query)).await??;
        clock.complete(StageOutcome::Retrieved {
            candidates: candidates.len(),
        });

        // Extracting
        clock.advance();
        let documents = if candidates.is_empty() {
            Vec::new()
        } else {
            let session = cancellable(cancel, clock.current(), self.launcher.launch()).await??;
            let extracted = cancellable(
                cancel,
                clock.current(),
                self.extractor
                    .extract_all(session.as_ref(), &candidates, clock.progress()),
            )
            .await;
            session.shutdown().await;
            extracted?
        };
        clock.complete(StageOutcome::Extracted {
            succeeded: documents.iter().filter(|d| d.has_text()).count(),
            attempted: documents.len(),
        });

        // Assembling
        clock.advance();
        let prompt = self.assembler.assemble(request, &documents)?;
        clock.complete(StageOutcome::Assembled {
            prompt_chars: prompt.char_len(),
            sources_included: prompt.included_sources().len(),
            sources_dropped: prompt.dropped_sources(),
        });

        // Generating
        clock.advance();
        let policy = cancellable(
            cancel,
            clock.current(),
            self.generation.generate(request, &prompt),
        )
        .await??;
        clock.complete(StageOutcome::Generated {
            chars: policy.content.chars().count(),
        });

        Ok(policy)
    }
}

/// Race `future` against cancellation; the loser is dropped.
async fn cancellable<T>(
    cancel: &CancellationToken,
    stage: PipelineStage,
    future: impl Future<Output = T>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled { stage }),
        output = future => Ok(output),
    }
}

/// Tracks the current stage and reports stage boundaries.
struct StageClock<'a> {
    progress: &'a dyn ProgressReporter,
    current: PipelineStage,
    started: Instant,
}

impl<'a> StageClock<'a> {
    fn start(progress: &'a dyn ProgressReporter) -> Self {
        let clock = Self {
            progress,
            current: PipelineStage::Formulating,
            started: Instant::now(),
        };
        clock.announce();
        clock
    }

    fn current(&self) -> PipelineStage {
        self.current
    }

    fn progress(&self) -> &'a dyn ProgressReporter {
        self.progress
    }

    fn advance(&mut self) {
        if let Some(next) = self.current.next() {
            self.current = next;
            self.started = Instant::now();
            self.announce();
        }
    }

    fn announce(&self) {
        tracing::debug!(stage = %self.current, "Stage started");
        self.progress.stage_started(self.current);
    }

    fn complete(&self, outcome: StageOutcome) {
        let report = StageReport {
            outcome,
            elapsed: self.started.elapsed(),
        };
        tracing::info!(
            stage = %report.stage(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "{}",
            report.outcome.summary()
        );
        self.progress.stage_completed(&report);
    }
}

/// Builder for [`PolicyPipeline`].
pub struct PolicyPipelineBuilder {
    searcher: Arc<dyn WebSearcher>,
    launcher: Arc<dyn BrowserLauncher>,
    generator: Arc<dyn TextGenerator>,
    validator: UrlValidator,
    max_results: usize,
    max_prompt_chars: usize,
    max_chars_per_page: usize,
    page_timeout: Duration,
    search_timeout: Duration,
    generation_timeout: Duration,
    extraction_concurrency: usize,
    pages_per_second: Option<NonZeroU32>,
    empty_context: EmptyContextPolicy,
    params: GenerationParams,
}

impl PolicyPipelineBuilder {
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        launcher: Arc<dyn BrowserLauncher>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let defaults = PipelineConfig::new("", "");
        Self {
            searcher,
            launcher,
            generator,
            validator: UrlValidator::new(),
            max_results: defaults.max_results,
            max_prompt_chars: defaults.max_prompt_chars,
            max_chars_per_page: defaults.max_chars_per_page,
            page_timeout: defaults.page_timeout,
            search_timeout: defaults.search_timeout,
            generation_timeout: defaults.generation_timeout,
            extraction_concurrency: defaults.extraction_concurrency,
            pages_per_second: defaults.pages_per_second,
            empty_context: defaults.empty_context,
            params: GenerationParams {
                temperature: defaults.temperature,
                max_output_tokens: defaults.max_output_tokens,
            },
        }
    }

    /// Copy every tunable from `config`.
    pub fn with_config(mut self, config: &PipelineConfig) -> Self {
        self.max_results = config.max_results;
        self.max_prompt_chars = config.max_prompt_chars;
        self.max_chars_per_page = config.max_chars_per_page;
        self.page_timeout = config.page_timeout;
        self.search_timeout = config.search_timeout;
        self.generation_timeout = config.generation_timeout;
        self.extraction_concurrency = config.extraction_concurrency;
        self.pages_per_second = config.pages_per_second;
        self.empty_context = config.empty_context;
        self.params = GenerationParams {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        };
        self
    }

    pub fn with_url_validator(mut self, validator: UrlValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    pub fn max_chars_per_page(mut self, max_chars: usize) -> Self {
        self.max_chars_per_page = max_chars;
        self
    }

    pub fn page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn extraction_concurrency(mut self, concurrency: usize) -> Self {
        self.extraction_concurrency = concurrency;
        self
    }

    pub fn pages_per_second(mut self, pages_per_second: NonZeroU32) -> Self {
        self.pages_per_second = Some(pages_per_second);
        self
    }

    pub fn empty_context(mut self, policy: EmptyContextPolicy) -> Self {
        self.empty_context = policy;
        self
    }

    pub fn generation_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Result<PolicyPipeline> {
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
        if self.extraction_concurrency == 0 {
            return Err(PipelineError::config(
                "POLICY_EXTRACTION_CONCURRENCY",
                "must be positive",
            ));
        }

        let retriever = SourceRetriever::new(self.searcher, self.max_results, self.search_timeout)
            .with_validator(self.validator);

        let mut extractor = ContentExtractor::new(self.page_timeout, self.max_chars_per_page)
            .with_concurrency(self.extraction_concurrency);
        if let Some(rate) = self.pages_per_second {
            extractor = extractor.with_rate_limit(rate);
        }

        Ok(PolicyPipeline {
            retriever,
            launcher: self.launcher,
            extractor,
            assembler: PromptAssembler::new(self.max_prompt_chars, self.empty_context),
            generation: GenerationClient::new(self.generator, self.params, self.generation_timeout),
        })
    }
}
