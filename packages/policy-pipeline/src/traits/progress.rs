//! Progress callbacks for the presentation layer.

use crate::types::document::ExtractedDocument;
use crate::types::stage::{PipelineStage, StageReport};

/// Observer for a pipeline run.
///
/// All methods default to no-ops. Callbacks run on the pipeline's task, so
/// implementations should return quickly.
pub trait ProgressReporter: Send + Sync {
    fn stage_started(&self, _stage: PipelineStage) {}

    fn stage_completed(&self, _report: &StageReport) {}

    /// Called once per candidate, in rank order. `index` is 0-based.
    fn source_extracted(&self, _index: usize, _total: usize, _document: &ExtractedDocument) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {}
