//! Text extracted from one candidate.

use serde::{Deserialize, Serialize};

use super::candidate::SourceCandidate;

/// Plain text extracted from a rendered source page.
///
/// `text` is empty when the page could not be loaded, timed out, or had no
/// readable content. Empty documents are dropped before prompt assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub source_url: String,
    pub title: String,
    pub text: String,
    /// Position of the source in the search ranking (0 = best).
    pub rank: usize,
}

impl ExtractedDocument {
    /// A document with text for `candidate`.
    pub fn new(candidate: &SourceCandidate, rank: usize, text: impl Into<String>) -> Self {
        Self {
            source_url: candidate.url.to_string(),
            title: candidate.display_title().to_string(),
            text: text.into(),
            rank,
        }
    }

    /// The placeholder for a failed extraction.
    pub fn empty(candidate: &SourceCandidate, rank: usize) -> Self {
        Self::new(candidate, rank, String::new())
    }

    /// Check if this document has usable text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Text length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_no_text() {
        let candidate = SourceCandidate::from_url("https://example.gov/a").unwrap();
        let doc = ExtractedDocument::empty(&candidate, 2);
        assert!(!doc.has_text());
        assert_eq!(doc.rank, 2);
        assert_eq!(doc.source_url, "https://example.gov/a");
    }

    #[test]
    fn test_char_len_counts_characters() {
        let candidate = SourceCandidate::from_url("https://example.gov/a").unwrap();
        let doc = ExtractedDocument::new(&candidate, 0, "Kündigung");
        assert_eq!(doc.char_len(), 9);
        assert!(doc.has_text());
    }
}
