//! Model backend implementations.
//!
//! [`build_credential_pool`] turns the configured API keys into a
//! [`CredentialPool`] with one Groq provider per key.

pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use applymate_core::llm::box_provider::BoxLlmProvider;
use applymate_core::llm::credential_pool::CredentialPool;
use applymate_types::config::{LlmConfig, UsageLimits};
use applymate_types::error::ConfigError;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::groq_defaults;

/// Create one provider per API key and pool them.
///
/// # Errors
///
/// [`ConfigError::MissingCredentials`] when `api_keys` is empty, and
/// [`ConfigError::Invalid`] when an HTTP client cannot be created.
pub fn build_credential_pool(
    api_keys: Vec<SecretString>,
    llm: &LlmConfig,
    limits: UsageLimits,
) -> Result<CredentialPool, ConfigError> {
    let providers = api_keys
        .into_iter()
        .map(|key| {
            let config = groq_defaults(key, &llm.text_model)
                .with_base_url(&llm.base_url)
                .with_timeouts(
                    Duration::from_secs(llm.request_timeout_secs),
                    Duration::from_secs(llm.vision_timeout_secs),
                );
            OpenAiCompatibleProvider::new(config)
                .map(BoxLlmProvider::new)
                .map_err(|e| ConfigError::Invalid(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        credentials = providers.len(),
        model = %llm.text_model,
        "Built model credential pool"
    );
    CredentialPool::new(providers, limits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_credential_per_key() {
        let keys = vec![SecretString::from("gsk-a"), SecretString::from("gsk-b")];
        let pool = build_credential_pool(keys, &LlmConfig::default(), UsageLimits::default()).unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn no_keys_is_missing_credentials() {
        let err = build_credential_pool(Vec::new(), &LlmConfig::default(), UsageLimits::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingCredentials(_)));
    }
}
