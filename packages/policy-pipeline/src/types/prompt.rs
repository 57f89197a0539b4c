//! The bounded prompt sent to the generation model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Instructions plus source context, never longer than the configured budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPrompt {
    text: String,
    included_sources: Vec<String>,
    dropped_sources: usize,
    as_of: NaiveDate,
}

impl GenerationPrompt {
    pub(crate) fn new(
        text: String,
        included_sources: Vec<String>,
        dropped_sources: usize,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            text,
            included_sources,
            dropped_sources,
            as_of,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters (the unit the budget is measured in).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// URLs of sources whose text made it into the prompt, in rank order.
    pub fn included_sources(&self) -> &[String] {
        &self.included_sources
    }

    /// Non-empty sources left out because they did not fit.
    pub fn dropped_sources(&self) -> usize {
        self.dropped_sources
    }

    /// The date the prompt is "current as of"; also the policy's effective date.
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl AsRef<str> for GenerationPrompt {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
