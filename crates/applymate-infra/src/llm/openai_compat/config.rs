//! Configuration and defaults for OpenAI-compatible chat completion backends.
//!
//! Groq is the only backend ApplyMate talks to, but the wire protocol is the
//! generic OpenAI one, so the base URL and model stay configurable.

use std::time::Duration;

use secrecy::SecretString;

use applymate_types::llm::ProviderCapabilities;

/// Configuration for an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g. "groq").
    pub provider_name: String,
    /// Base URL for the API, without the `/chat/completions` path.
    pub base_url: String,
    /// API key for this credential.
    pub api_key: SecretString,
    /// Model used when a request leaves `model` empty.
    pub model: String,
    pub capabilities: ProviderCapabilities,
    /// HTTP timeout for text requests.
    pub request_timeout: Duration,
    /// HTTP timeout for requests carrying images.
    pub vision_timeout: Duration,
}

/// Groq default configuration.
///
/// Base URL: `https://api.groq.com/openai/v1`
/// Capabilities: tool calling, vision; 128K context, 8K output.
pub fn groq_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "groq".into(),
        base_url: "https://api.groq.com/openai/v1".into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            tool_calling: true,
            vision: true,
            max_context_tokens: 131_072,
            max_output_tokens: 8_192,
        },
        request_timeout: Duration::from_secs(15),
        vision_timeout: Duration::from_secs(20),
    }
}

impl OpenAiCompatConfig {
    /// Override the base URL (proxies, self-hosted gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeouts(mut self, request: Duration, vision: Duration) -> Self {
        self.request_timeout = request;
        self.vision_timeout = vision;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groq_defaults_point_at_groq() {
        let config = groq_defaults(SecretString::from("gsk-test"), "llama-3.3-70b-versatile");
        assert_eq!(config.provider_name, "groq");
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert!(config.capabilities.tool_calling);
        assert!(config.capabilities.vision);
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let config = groq_defaults(SecretString::from("k"), "m").with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }
}
