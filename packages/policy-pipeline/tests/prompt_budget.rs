//! Property tests for prompt assembly.

use chrono::NaiveDate;
use proptest::prelude::*;

use policy_pipeline::{
    EmptyContextPolicy, ExtractedDocument, PolicyRequest, PromptAssembler, SourceCandidate,
};

fn documents(sizes: &[usize]) -> Vec<ExtractedDocument> {
    sizes
        .iter()
        .enumerate()
        .map(|(rank, size)| {
            let candidate = SourceCandidate::from_url(&format!("https://s{}.gov/", rank))
                .unwrap()
                .with_title(format!("Source {}", rank));
            ExtractedDocument::new(&candidate, rank, "é".repeat(*size))
        })
        .collect()
}

proptest! {
    #[test]
    fn prompt_never_exceeds_budget(
        sizes in prop::collection::vec(0usize..8_000, 0..8),
        budget in 2_048usize..30_000,
    ) {
        let request = PolicyRequest::new("France", "Data Protection Policy").unwrap();
        let assembler = PromptAssembler::new(budget, EmptyContextPolicy::InstructionsOnly);
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let docs = documents(&sizes);
        let prompt = assembler.assemble_on(&request, &docs, today).unwrap();

        prop_assert!(prompt.char_len() <= budget);

        // Included sources are a prefix of the non-empty documents, in rank order
        let usable: Vec<String> = docs
            .iter()
            .filter(|d| d.has_text())
            .map(|d| d.source_url.clone())
            .collect();
        let included = prompt.included_sources();
        prop_assert_eq!(included, &usable[..included.len()]);
        prop_assert_eq!(included.len() + prompt.dropped_sources(), usable.len());
    }
}

#[test]
fn only_first_document_fits_seven_thousand() {
    let request = PolicyRequest::new("Germany", "Remote Work Policy").unwrap();
    let assembler = PromptAssembler::new(7_000, EmptyContextPolicy::Fail);
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

    let docs = documents(&[5_000, 3_000, 9_000]);
    let prompt = assembler.assemble_on(&request, &docs, today).unwrap();

    assert_eq!(prompt.included_sources(), ["https://s0.gov/".to_string()]);
    assert!(prompt.char_len() <= 7_000);
}
