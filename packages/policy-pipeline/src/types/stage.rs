//! Pipeline stages and per-stage reports.

use std::fmt;
use std::time::Duration;

/// Forward-only pipeline stages.
///
/// A run moves `Formulating → Retrieving → Extracting → Assembling →
/// Generating` and then ends as completed or failed. There is no backward
/// transition; a failed run restarts from `Formulating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Formulating,
    Retrieving,
    Extracting,
    Assembling,
    Generating,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::Formulating,
        PipelineStage::Retrieving,
        PipelineStage::Extracting,
        PipelineStage::Assembling,
        PipelineStage::Generating,
    ];

    /// The stage after this one, or `None` after generation.
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            Self::Formulating => Some(Self::Retrieving),
            Self::Retrieving => Some(Self::Extracting),
            Self::Extracting => Some(Self::Assembling),
            Self::Assembling => Some(Self::Generating),
            Self::Generating => None,
        }
    }

    /// 1-based position, for "step 2/5" style display.
    pub fn position(self) -> usize {
        self as usize + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Formulating => "Formulating search query",
            Self::Retrieving => "Searching for official sources",
            Self::Extracting => "Extracting source content",
            Self::Assembling => "Assembling prompt",
            Self::Generating => "Generating policy",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Formulating => "formulating",
            Self::Retrieving => "retrieving",
            Self::Extracting => "extracting",
            Self::Assembling => "assembling",
            Self::Generating => "generating",
        };
        f.write_str(name)
    }
}

/// What a completed stage produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Formulated { query: String },
    Retrieved { candidates: usize },
    Extracted { succeeded: usize, attempted: usize },
    Assembled {
        prompt_chars: usize,
        sources_included: usize,
        sources_dropped: usize,
    },
    Generated { chars: usize },
}

impl StageOutcome {
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Formulated { .. } => PipelineStage::Formulating,
            Self::Retrieved { .. } => PipelineStage::Retrieving,
            Self::Extracted { .. } => PipelineStage::Extracting,
            Self::Assembled { .. } => PipelineStage::Assembling,
            Self::Generated { .. } => PipelineStage::Generating,
        }
    }

    /// One-line summary for progress display.
    pub fn summary(&self) -> String {
        match self {
            Self::Formulated { query } => format!("query: {}", query),
            Self::Retrieved { candidates } => format!("found {} candidate sources", candidates),
            Self::Extracted {
                succeeded,
                attempted,
            } => format!("extracted text from {}/{} sources", succeeded, attempted),
            Self::Assembled {
                prompt_chars,
                sources_included,
                sources_dropped,
            } => format!(
                "{} chars from {} sources ({} dropped for length)",
                prompt_chars, sources_included, sources_dropped
            ),
            Self::Generated { chars } => format!("{} chars generated", chars),
        }
    }
}

/// Report passed to progress callbacks once per completed stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub outcome: StageOutcome,
    pub elapsed: Duration,
}

impl StageReport {
    pub fn stage(&self) -> PipelineStage {
        self.outcome.stage()
    }
}
