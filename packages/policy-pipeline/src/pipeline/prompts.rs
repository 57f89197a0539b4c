//! LLM prompts for policy drafting.

/// Separator line opening each source block.
pub fn source_block(title: &str, url: &str, text: &str) -> String {
    format!("\n\n--- SOURCE: {} ({}) ---\n{}", title, url, text)
}

/// Used in place of source blocks when generating without sources.
pub const NO_SOURCES_NOTE: &str = "\n\nNo official sources could be retrieved for this request. Draft the policy from established employment law for this location and mark every statutory figure that should be verified with local counsel.";

/// The drafting instructions with `sources` placed in the context slot.
///
/// Values are substituted in a single pass, so braces in user input are
/// never treated as placeholders.
pub fn policy_prompt(policy_type: &str, location: &str, as_of: &str, sources: &str) -> String {
    format!(
        r#"As an expert HR policy consultant, create a comprehensive {policy_type} policy for {location}.

Use the following official legal and regulatory information as your primary source:
{sources}

Requirements:
1. Create a professional, legally compliant {policy_type} policy
2. Include all mandatory requirements specific to {location}
3. Structure the policy with clear sections and subsections
4. Include purpose, scope, definitions, procedures, and compliance requirements
5. Add relevant legal references and citations where applicable
6. Ensure the language is clear, professional, and actionable
7. Include effective date and review requirements
8. Add any location-specific cultural or legal considerations

Format the policy as a complete, ready-to-implement Markdown document with:
- Policy title and version
- Effective date
- Table of contents
- All required sections
- Appendices if needed

Make sure the policy is current as of {as_of} and complies with the latest regulations."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_prompt_fills_slots() {
        let prompt = policy_prompt("Remote Work Policy", "Germany", "October 2026", "\n\nCTX");
        assert!(prompt.contains("comprehensive Remote Work Policy policy for Germany."));
        assert!(prompt.contains("primary source:\n\n\nCTX\n\nRequirements:"));
        assert!(prompt.contains("current as of October 2026"));
    }

    #[test]
    fn test_braces_in_input_are_literal() {
        let prompt = policy_prompt("{sources}", "{location}", "May 2026", "");
        assert!(prompt.contains("comprehensive {sources} policy for {location}."));
    }

    #[test]
    fn test_source_block_format() {
        assert_eq!(
            source_block("Working Time Act", "https://a.gov/wta", "Text"),
            "\n\n--- SOURCE: Working Time Act (https://a.gov/wta) ---\nText"
        );
    }

    #[test]
    fn test_template_leaves_room_for_sources() {
        let base = policy_prompt("", "", "September 2026", "");
        assert!(base.chars().count() < 1_500);
    }
}
