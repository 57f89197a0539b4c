//! Policy generation: one model call with a deadline.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::{GenerationError, PipelineError, Result};
use crate::traits::generator::{GenerationParams, TextGenerator};
use crate::types::policy::PolicyDocument;
use crate::types::prompt::GenerationPrompt;
use crate::types::request::PolicyRequest;

/// Sends the assembled prompt to the model and wraps the reply.
pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn TextGenerator>, params: GenerationParams, timeout: Duration) -> Self {
        Self {
            generator,
            params,
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Generate the policy. Empty or whitespace-only output is an error.
    pub async fn generate(
        &self,
        request: &PolicyRequest,
        prompt: &GenerationPrompt,
    ) -> Result<PolicyDocument> {
        let text = tokio::time::timeout(
            self.timeout,
            self.generator.generate(prompt.as_str(), &self.params),
        )
        .await
        .map_err(|_| GenerationError::Timeout {
            secs: self.timeout.as_secs(),
        })??;

        if text.trim().is_empty() {
            return Err(PipelineError::GenerationFailed(GenerationError::Empty));
        }

        let generated_at = Utc::now();
        let content = text.trim().to_string();

        Ok(PolicyDocument {
            title: document_title(&content, request),
            policy_type: request.policy_type().to_string(),
            location: request.location(),
            effective_date: prompt.as_of(),
            content,
            sources: prompt.included_sources().to_vec(),
            model: self.generator.model().to_string(),
            generated_at,
        })
    }
}

/// First top-level heading, else "{policy type} ({location})".
fn document_title(content: &str, request: &PolicyRequest) -> String {
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().trim_matches('*').trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("{} ({})", request.policy_type(), request.location()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::MockGenerator;
    use chrono::NaiveDate;

    fn request() -> PolicyRequest {
        PolicyRequest::new("Germany", "Remote Work Policy").unwrap()
    }

    fn prompt() -> GenerationPrompt {
        GenerationPrompt::new(
            "draft it".into(),
            vec!["https://a.gov/".into()],
            0,
            NaiveDate::from_ymd_opt(2026, 10, 31).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_wraps_model_output() {
        let generator = Arc::new(
            MockGenerator::new().with_response("# Remote Work Policy\n\n## 1. Purpose\nText\n"),
        );
        let client = GenerationClient::new(
            generator.clone(),
            GenerationParams::default(),
            Duration::from_secs(5),
        );

        let policy = client.generate(&request(), &prompt()).await.unwrap();
        assert_eq!(policy.title, "Remote Work Policy");
        assert_eq!(policy.location, "Germany");
        assert_eq!(policy.sources, vec!["https://a.gov/".to_string()]);
        assert_eq!(policy.model, "mock-model");
        assert_eq!(generator.prompts(), vec!["draft it".to_string()]);
    }

    #[tokio::test]
    async fn test_effective_date_matches_prompt_date() {
        let generator = Arc::new(MockGenerator::new().with_response("# Policy\nText"));
        let client = GenerationClient::new(generator, GenerationParams::default(), Duration::from_secs(5));

        let prompt = prompt();
        let policy = client.generate(&request(), &prompt).await.unwrap();
        assert_eq!(policy.effective_date, prompt.as_of());
        assert_eq!(policy.effective_date, NaiveDate::from_ymd_opt(2026, 10, 31).unwrap());
    }

    #[tokio::test]
    async fn test_title_falls_back_to_request() {
        let generator = Arc::new(MockGenerator::new().with_response("Plain text policy"));
        let client = GenerationClient::new(generator, GenerationParams::default(), Duration::from_secs(5));

        let policy = client.generate(&request(), &prompt()).await.unwrap();
        assert_eq!(policy.title, "Remote Work Policy (Germany)");
    }

    #[tokio::test]
    async fn test_empty_output_fails() {
        let generator = Arc::new(MockGenerator::new().with_response("  \n "));
        let client = GenerationClient::new(generator, GenerationParams::default(), Duration::from_secs(5));

        let err = client.generate(&request(), &prompt()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GenerationFailed);
        assert!(matches!(err, PipelineError::GenerationFailed(GenerationError::Empty)));
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let generator = Arc::new(
            MockGenerator::new()
                .with_response("late")
                .with_delay(Duration::from_secs(10)),
        );
        let client = GenerationClient::new(generator, GenerationParams::default(), Duration::from_millis(50));

        let err = client.generate(&request(), &prompt()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::GenerationFailed(GenerationError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_provider_errors_map_to_generation_failed() {
        let generator =
            Arc::new(MockGenerator::new().with_error(|| GenerationError::Quota("exhausted".into())));
        let client = GenerationClient::new(generator, GenerationParams::default(), Duration::from_secs(5));

        let err = client.generate(&request(), &prompt()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    }
}
