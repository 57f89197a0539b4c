//! The policy pipeline stages and the run that ties them together.
//!
//! - Query formulation
//! - Source retrieval (search + URL screening)
//! - Content extraction (headless browser + HTML to text)
//! - Prompt assembly under a character budget
//! - Generation

pub mod assemble;
pub mod extract;
pub mod generate;
pub mod html_text;
pub mod prompts;
pub mod query;
pub mod retrieve;
pub mod run;

pub use assemble::PromptAssembler;
pub use extract::ContentExtractor;
pub use generate::GenerationClient;
pub use html_text::html_to_text;
pub use query::{formulate, query_for, SOURCE_QUALIFIER};
pub use retrieve::SourceRetriever;
pub use run::{PolicyPipeline, PolicyPipelineBuilder};
