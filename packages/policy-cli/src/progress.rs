//! Terminal progress output for a pipeline run.
//!
//! Written to stderr so `--print` output on stdout stays clean.

use colored::Colorize;
use console::truncate_str;
use policy_pipeline::{ExtractedDocument, PipelineStage, ProgressReporter, StageReport};

const TITLE_WIDTH: usize = 60;

pub struct TerminalProgress {
    quiet: bool,
}

impl TerminalProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressReporter for TerminalProgress {
    fn stage_started(&self, stage: PipelineStage) {
        if self.quiet {
            return;
        }
        eprintln!(
            "{} {}...",
            format!("[{}/{}]", stage.position(), PipelineStage::ALL.len()).bright_blue(),
            stage.label().bold()
        );
    }

    fn stage_completed(&self, report: &StageReport) {
        if self.quiet {
            return;
        }
        eprintln!(
            "      {} {} {}",
            "✓".bright_green(),
            report.outcome.summary(),
            format!("({:.1}s)", report.elapsed.as_secs_f64()).dimmed()
        );
    }

    fn source_extracted(&self, index: usize, total: usize, document: &ExtractedDocument) {
        if self.quiet {
            return;
        }
        let marker = if document.has_text() {
            "✓".green()
        } else {
            "✗".red()
        };
        eprintln!(
            "      {} {} {}",
            format!("{}/{}", index + 1, total).dimmed(),
            marker,
            source_label(document)
        );
    }
}

fn source_label(document: &ExtractedDocument) -> String {
    let label = if document.title.trim().is_empty() {
        document.source_url.as_str()
    } else {
        document.title.as_str()
    };
    truncate_str(label, TITLE_WIDTH, "…").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str) -> ExtractedDocument {
        ExtractedDocument {
            source_url: "https://www.gov.uk/holiday-entitlement-rights".into(),
            title: title.into(),
            text: String::new(),
            rank: 0,
        }
    }

    #[test]
    fn test_label_falls_back_to_url() {
        assert_eq!(
            source_label(&doc("  ")),
            "https://www.gov.uk/holiday-entitlement-rights"
        );
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let label = source_label(&doc(&"Holiday entitlement ".repeat(10)));
        assert!(label.chars().count() <= TITLE_WIDTH);
        assert!(label.ends_with('…'));
    }
}
