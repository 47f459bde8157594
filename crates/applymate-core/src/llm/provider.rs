//! LlmProvider trait definition.
//!
//! This is the core abstraction that all model backends implement.
//! Uses RPITIT for `complete` and `count_tokens`.

use applymate_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, TokenCount,
};

/// Trait for model backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). A provider
/// instance is bound to a single API credential; the credential pool owns one
/// provider per credential.
///
/// Implementations live in applymate-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "groq").
    fn name(&self) -> &str;

    /// What this provider supports (tool calling, vision, etc.).
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a completion request and receive the full response.
    ///
    /// Tool definitions and the tool choice travel inside the request; the
    /// response carries either final text or tool-call requests.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;

    /// Count the tokens in a request without sending it to the model.
    fn count_tokens(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<TokenCount, LlmError>> + Send;
}
