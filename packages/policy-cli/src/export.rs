//! Saving generated policies to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use policy_pipeline::PolicyDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Plain policy text
    Txt,
    /// Markdown with a title and metadata header
    Md,
    /// Both files
    Both,
}

impl ExportFormat {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Txt => &["txt"],
            Self::Md => &["md"],
            Self::Both => &["txt", "md"],
        }
    }
}

/// `{policy_type}_{location}_policy.{ext}` with path separators replaced.
pub fn file_name(policy: &PolicyDocument, extension: &str) -> String {
    let stem = format!(
        "{}_{}_policy",
        policy.policy_type,
        policy.location.replace(", ", "_")
    );
    format!("{}.{}", sanitize(&stem), extension)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

pub fn render_markdown(policy: &PolicyDocument) -> String {
    format!(
        "# {}\n\n**Location:** {}\n\n**Generated:** {}\n\n---\n\n{}",
        policy.policy_type,
        policy.location,
        policy.effective_date.format("%Y-%m-%d"),
        policy.content
    )
}

fn render(policy: &PolicyDocument, extension: &str) -> String {
    match extension {
        "md" => render_markdown(policy),
        _ => policy.content.clone(),
    }
}

/// Write the policy in `format` under `dir`, returning the written paths.
pub fn save(policy: &PolicyDocument, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::new();
    for extension in format.extensions() {
        let path = dir.join(file_name(policy, extension));
        std::fs::write(&path, render(policy, extension))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Policy saved");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn policy(policy_type: &str, location: &str) -> PolicyDocument {
        PolicyDocument {
            title: policy_type.into(),
            policy_type: policy_type.into(),
            location: location.into(),
            effective_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            content: "# Policy\n\n## 1. Purpose\nText.".into(),
            sources: vec![],
            model: "mock-model".into(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_name_joins_location_parts() {
        let p = policy("Overtime Policy", "Ontario, Canada");
        assert_eq!(file_name(&p, "txt"), "Overtime Policy_Ontario_Canada_policy.txt");
    }

    #[test]
    fn test_file_name_replaces_path_separators() {
        let p = policy("Maternity/Paternity Leave Policy", "Germany");
        assert_eq!(
            file_name(&p, "md"),
            "Maternity-Paternity Leave Policy_Germany_policy.md"
        );
    }

    #[test]
    fn test_markdown_header() {
        let md = render_markdown(&policy("Remote Work Policy", "France"));
        assert!(md.starts_with("# Remote Work Policy\n\n**Location:** France\n\n**Generated:** 2026-10-19\n\n---\n\n"));
        assert!(md.ends_with("Text."));
    }

    #[test]
    fn test_save_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let p = policy("Sick Leave Policy", "India");

        let written = save(&p, dir.path(), ExportFormat::Both).unwrap();

        assert_eq!(written.len(), 2);
        let txt = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(txt, p.content);
        let md = std::fs::read_to_string(&written[1]).unwrap();
        assert!(md.contains("**Location:** India"));
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out/policies");

        let written = save(&policy("Social Media Policy", "Singapore"), &nested, ExportFormat::Txt)
            .unwrap();

        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with(&nested));
    }
}
