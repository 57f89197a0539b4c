//! Operator input for a single run.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Longest accepted country, region, or policy-type string (characters).
pub const MAX_FIELD_CHARS: usize = 200;

/// What to draft and for where.
///
/// Fields are normalized (trimmed, internal whitespace collapsed) and
/// validated on construction; the request is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRequest {
    country: String,
    policy_type: String,
    region: Option<String>,
}

impl PolicyRequest {
    /// Create a validated request.
    pub fn new(country: impl AsRef<str>, policy_type: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            country: normalize_field("country", country.as_ref())?,
            policy_type: normalize_field("policy type", policy_type.as_ref())?,
            region: None,
        })
    }

    /// Narrow to a state or province (e.g. "California").
    ///
    /// A blank region is treated as no region.
    pub fn with_region(mut self, region: impl AsRef<str>) -> Result<Self> {
        let region = region.as_ref();
        self.region = if region.trim().is_empty() {
            None
        } else {
            Some(normalize_field("region", region)?)
        };
        Ok(self)
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn policy_type(&self) -> &str {
        &self.policy_type
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// "{region}, {country}" when a region is set, else the country.
    pub fn location(&self) -> String {
        match &self.region {
            Some(region) => format!("{}, {}", region, self.country),
            None => self.country.clone(),
        }
    }
}

/// Trim, collapse whitespace, and bound the length of a user-supplied field.
pub(crate) fn normalize_field(name: &str, value: &str) -> Result<String> {
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalized.is_empty() {
        return Err(PipelineError::invalid_input(format!("{} must not be empty", name)));
    }
    if normalized.chars().count() > MAX_FIELD_CHARS {
        return Err(PipelineError::invalid_input(format!(
            "{} must be at most {} characters",
            name, MAX_FIELD_CHARS
        )));
    }
    if normalized.chars().any(char::is_control) {
        return Err(PipelineError::invalid_input(format!(
            "{} contains control characters",
            name
        )));
    }

    Ok(normalized)
}
