//! Search query formulation.

use crate::error::Result;
use crate::types::request::PolicyRequest;

/// Appended to every query to steer results toward primary legal sources.
pub const SOURCE_QUALIFIER: &str =
    "official government policy law regulation site:gov OR site:legislation OR site:official";

/// Build the search query for a country and policy type.
///
/// Inputs are trimmed and whitespace-collapsed; blank or oversized inputs
/// fail with `InvalidInput`. The result is deterministic.
pub fn formulate(country: &str, policy_type: &str) -> Result<String> {
    let request = PolicyRequest::new(country, policy_type)?;
    Ok(query_for(&request))
}

/// Build the search query for an already validated request.
pub fn query_for(request: &PolicyRequest) -> String {
    format!(
        "{} {} {}",
        request.policy_type(),
        request.location(),
        SOURCE_QUALIFIER
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_formulate_normalizes_whitespace() {
        let query = formulate("  Germany ", "Remote   Work\tPolicy").unwrap();
        assert_eq!(
            query,
            format!("Remote Work Policy Germany {}", SOURCE_QUALIFIER)
        );
    }

    #[test]
    fn test_formulate_is_deterministic() {
        assert_eq!(
            formulate("Japan", "Parental Leave Policy").unwrap(),
            formulate("Japan", "Parental Leave Policy").unwrap()
        );
    }

    #[test]
    fn test_region_is_part_of_location() {
        let request = PolicyRequest::new("Canada", "Sick Leave Policy")
            .unwrap()
            .with_region("Ontario")
            .unwrap();
        assert!(query_for(&request).starts_with("Sick Leave Policy Ontario, Canada official"));
    }

    #[test]
    fn test_blank_input_rejected() {
        let err = formulate("   ", "Remote Work Policy").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(formulate("Germany", "").is_err());
    }

    #[test]
    fn test_oversized_input_rejected() {
        let long = "x".repeat(201);
        assert_eq!(
            formulate("Germany", &long).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }
}
