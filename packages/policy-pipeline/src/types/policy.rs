//! The generated policy document.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A drafted policy.
///
/// `content` is the model output kept verbatim; the pipeline does not
/// validate its structure. [`PolicyDocument::sections`] offers a light
/// heading-based split for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub title: String,
    pub policy_type: String,
    pub location: String,
    pub effective_date: NaiveDate,
    pub content: String,
    /// Source URLs that fed the prompt, in rank order.
    pub sources: Vec<String>,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

/// A heading and the text under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySection {
    pub heading: String,
    pub body: String,
}

impl PolicyDocument {
    /// Split `content` on Markdown ATX headings (`#` through `######`).
    ///
    /// Text before the first heading becomes a section with an empty
    /// heading. Headings inside fenced code blocks are ignored.
    pub fn sections(&self) -> Vec<PolicySection> {
        let mut sections = Vec::new();
        let mut heading = String::new();
        let mut body: Vec<&str> = Vec::new();
        let mut in_fence = false;

        for line in self.content.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") {
                in_fence = !in_fence;
            }

            match (!in_fence).then(|| parse_heading(trimmed)).flatten() {
                Some(next_heading) => {
                    push_section(&mut sections, &heading, &body);
                    heading = next_heading.to_string();
                    body.clear();
                }
                None => body.push(line),
            }
        }
        push_section(&mut sections, &heading, &body);

        sections
    }
}

fn parse_heading(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    (!text.is_empty()).then_some(text)
}

fn push_section(sections: &mut Vec<PolicySection>, heading: &str, body: &[&str]) {
    let body = body.join("\n").trim().to_string();
    if heading.is_empty() && body.is_empty() {
        return;
    }
    sections.push(PolicySection {
        heading: heading.to_string(),
        body,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> PolicyDocument {
        PolicyDocument {
            title: "Remote Work Policy".into(),
            policy_type: "Remote Work Policy".into(),
            location: "Germany".into(),
            effective_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            content: content.into(),
            sources: vec![],
            model: "mock".into(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sections_split_on_headings() {
        let policy = doc("# Remote Work Policy\nVersion 1.0\n\n## 1. Purpose\nWhy.\n\n## 2. Scope\nWho.\n");
        let sections = policy.sections();

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].heading, "Remote Work Policy");
        assert_eq!(sections[0].body, "Version 1.0");
        assert_eq!(sections[1].heading, "1. Purpose");
        assert_eq!(sections[2].body, "Who.");
    }

    #[test]
    fn test_preamble_without_heading() {
        let sections = doc("Draft for review.\n\n# Policy\nBody").sections();
        assert_eq!(sections[0].heading, "");
        assert_eq!(sections[0].body, "Draft for review.");
        assert_eq!(sections[1].heading, "Policy");
    }

    #[test]
    fn test_hash_without_space_is_not_heading() {
        let sections = doc("#hashtag\n####### seven").sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "");
    }

    #[test]
    fn test_fenced_code_is_not_split() {
        let sections = doc("# A\n```\n# not a heading\n```\ntext").sections();
        assert_eq!(sections.len(), 1);
        assert!(sections[0].body.contains("# not a heading"));
    }
}
