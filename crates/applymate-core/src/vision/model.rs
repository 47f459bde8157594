//! Vision-model extractor routed through the credential pool.

use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, info_span};

use applymate_types::config::LlmConfig;
use applymate_types::error::ExtractionError;
use applymate_types::llm::{CompletionRequest, LlmError, Message};

use crate::llm::credential_pool::CredentialPool;

use super::extractor::ImageExtractor;

const EXTRACTION_PROMPT: &str = "You are an expert at extracting job details from images. \
Please analyze this image and extract the following information:

1. Job Title (e.g., Software Engineer, Data Analyst)
2. Company Name
3. Job Location (e.g., USA, UK, Remote, California, San Jose, Texas)
4. Job Type (Full-time or Intern - if not stated, assume Full-time)

Return ONLY the extracted information in this exact format:
- Job Title: [extracted title]
- Company Name: [extracted company]
- Location: [extracted location]
- Type: [Full-time or Intern]

If any information is not visible or unclear in the image, write \"Not found\" for that field.";

/// Asks a vision model to read a job posting image.
///
/// One credential is selected per image and one call is made; each
/// successful call is charged a fixed token estimate since the backend's
/// image token accounting is not reported reliably.
pub struct VisionExtractor {
    pool: Arc<CredentialPool>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    token_estimate: u32,
}

impl VisionExtractor {
    pub fn new(pool: Arc<CredentialPool>, config: &LlmConfig) -> Self {
        Self {
            pool,
            model: config.vision_model.clone(),
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.vision_timeout_secs),
            token_estimate: config.vision_token_estimate,
        }
    }

    fn request(&self, image_url: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user_with_image(EXTRACTION_PROMPT, image_url)],
            system: None,
            max_tokens: self.max_tokens,
            temperature: Some(0.0),
            tools: Vec::new(),
            tool_choice: None,
        }
    }
}

impl ImageExtractor for VisionExtractor {
    async fn extract(&self, image_url: &str) -> Result<String, ExtractionError> {
        if image_url.trim().is_empty() {
            return Err(ExtractionError::InvalidImage("empty image URL".to_string()));
        }

        let request = self.request(image_url);
        let credential = self.pool.select();
        let span = info_span!(
            "gen_ai.vision",
            gen_ai.operation.name = "chat",
            gen_ai.request.model = %request.model,
            credential = %credential.id,
        );

        let call = tokio::time::timeout(self.timeout, credential.provider.complete(&request))
            .instrument(span)
            .await;

        let response = match call {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(classify(err)),
            Err(_) => {
                return Err(ExtractionError::Other(format!(
                    "vision request timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        self.pool
            .record_usage(&credential.id, u64::from(self.token_estimate));

        if response.content.trim().is_empty() {
            return Err(ExtractionError::Other(
                "No response from vision model".to_string(),
            ));
        }
        Ok(response.content)
    }
}

fn classify(err: LlmError) -> ExtractionError {
    tracing::warn!(error = %err, "Image extraction failed");
    match err {
        LlmError::RateLimited { .. } => ExtractionError::RateLimited,
        LlmError::InvalidRequest(message) => ExtractionError::InvalidImage(message),
        other => {
            let message = other.to_string();
            if message.to_lowercase().contains("image") {
                ExtractionError::InvalidImage(message)
            } else {
                ExtractionError::Other(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use applymate_types::config::UsageLimits;

    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::testing::{ScriptedProvider, final_answer};

    fn build(provider: ScriptedProvider) -> (VisionExtractor, Arc<CredentialPool>) {
        let pool = Arc::new(
            CredentialPool::new(vec![BoxLlmProvider::new(provider)], UsageLimits::default())
                .unwrap(),
        );
        (VisionExtractor::new(pool.clone(), &LlmConfig::default()), pool)
    }

    #[tokio::test]
    async fn returns_model_text_and_charges_estimate() {
        let provider = ScriptedProvider::named("p")
            .then_ok(final_answer("- Job Title: SWE\n- Company Name: Acme"));
        let log = provider.calls();
        let (extractor, pool) = build(provider);

        let text = extractor.extract("https://example.com/job.png").await.unwrap();
        assert!(text.contains("Company Name: Acme"));

        let request = &log.requests()[0];
        assert_eq!(request.model, "llama-3.2-90b-vision-preview");
        assert_eq!(request.messages[0].image_urls, vec!["https://example.com/job.png"]);
        assert!(request.messages[0].content.contains("- Job Title: [extracted title]"));
        assert!(request.tools.is_empty());

        let stats = pool.stats();
        assert_eq!(stats[0].rpm, "1/30");
        assert_eq!(stats[0].tpm, "2000/30000");
    }

    #[tokio::test]
    async fn rate_limit_is_classified() {
        let provider = ScriptedProvider::named("p").then_err(LlmError::RateLimited {
            retry_after_ms: None,
        });
        let (extractor, pool) = build(provider);

        let err = extractor.extract("https://example.com/a.png").await.unwrap_err();
        assert!(matches!(err, ExtractionError::RateLimited));
        assert_eq!(pool.stats()[0].rpm, "0/30");
    }

    #[tokio::test]
    async fn rejected_image_is_classified() {
        let provider = ScriptedProvider::named("p")
            .then_err(LlmError::InvalidRequest("image too large".into()));
        let (extractor, _) = build(provider);
        assert!(matches!(
            extractor.extract("https://example.com/a.png").await,
            Err(ExtractionError::InvalidImage(_))
        ));

        let (extractor, _) = build(ScriptedProvider::named("p"));
        assert!(matches!(
            extractor.extract("  ").await,
            Err(ExtractionError::InvalidImage(_))
        ));
    }

    #[tokio::test]
    async fn other_failures_and_empty_text() {
        let provider = ScriptedProvider::named("p").then_err(LlmError::Overloaded("503".into()));
        let (extractor, _) = build(provider);
        assert!(matches!(
            extractor.extract("https://example.com/a.png").await,
            Err(ExtractionError::Other(_))
        ));

        let provider = ScriptedProvider::named("p").then_ok(final_answer(""));
        let (extractor, _) = build(provider);
        let err = extractor.extract("https://example.com/a.png").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to analyze image: No response from vision model"
        );
    }
}
