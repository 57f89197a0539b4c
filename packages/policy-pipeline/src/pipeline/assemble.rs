//! Prompt assembly under a character budget.
//!
//! Sources are appended whole, in rank order, until the next block would
//! overflow the budget. Nothing is summarized or cut mid-source.

use chrono::{Local, NaiveDate};

use crate::config::EmptyContextPolicy;
use crate::error::{PipelineError, Result};
use crate::pipeline::prompts::{policy_prompt, source_block, NO_SOURCES_NOTE};
use crate::types::document::ExtractedDocument;
use crate::types::prompt::GenerationPrompt;
use crate::types::request::PolicyRequest;

/// Builds the bounded generation prompt.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_prompt_chars: usize,
    empty_context: EmptyContextPolicy,
}

impl PromptAssembler {
    pub fn new(max_prompt_chars: usize, empty_context: EmptyContextPolicy) -> Self {
        Self {
            max_prompt_chars,
            empty_context,
        }
    }

    /// Assemble with today's date in the "current as of" line.
    pub fn assemble(
        &self,
        request: &PolicyRequest,
        documents: &[ExtractedDocument],
    ) -> Result<GenerationPrompt> {
        self.assemble_on(request, documents, Local::now().date_naive())
    }

    /// Assemble as of `today`.
    pub fn assemble_on(
        &self,
        request: &PolicyRequest,
        documents: &[ExtractedDocument],
        today: NaiveDate,
    ) -> Result<GenerationPrompt> {
        let location = request.location();
        let as_of = today.format("%B %Y").to_string();
        let render = |sources: &str| policy_prompt(request.policy_type(), &location, &as_of, sources);

        let base_chars = render("").chars().count();
        if base_chars > self.max_prompt_chars {
            return Err(PipelineError::config(
                "POLICY_MAX_PROMPT_CHARS",
                format!(
                    "instructions alone need {} chars, budget is {}",
                    base_chars, self.max_prompt_chars
                ),
            ));
        }

        let mut usable: Vec<&ExtractedDocument> = documents.iter().filter(|d| d.has_text()).collect();
        usable.sort_by_key(|d| d.rank);

        let mut sources = String::new();
        let mut used = base_chars;
        let mut included = Vec::new();

        for document in &usable {
            let block = source_block(&document.title, &document.source_url, &document.text);
            let block_chars = block.chars().count();
            if used + block_chars > self.max_prompt_chars {
                break;
            }
            used += block_chars;
            sources.push_str(&block);
            included.push(document.source_url.clone());
        }

        let dropped = usable.len() - included.len();
        if dropped > 0 {
            tracing::info!(
                included = included.len(),
                dropped,
                budget = self.max_prompt_chars,
                "Sources dropped to fit prompt budget"
            );
        }

        if included.is_empty() {
            match self.empty_context {
                EmptyContextPolicy::Fail => {
                    return Err(PipelineError::EmptyContext {
                        attempted: documents.len(),
                    });
                }
                EmptyContextPolicy::InstructionsOnly => {
                    tracing::warn!(
                        attempted = documents.len(),
                        "No usable sources, generating from instructions only"
                    );
                    if base_chars + NO_SOURCES_NOTE.chars().count() <= self.max_prompt_chars {
                        sources.push_str(NO_SOURCES_NOTE);
                    }
                }
            }
        }

        Ok(GenerationPrompt::new(render(&sources), included, dropped, today))
    }
}
