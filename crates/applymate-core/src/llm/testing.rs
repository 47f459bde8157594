//! Scripted provider used by unit tests across the crate.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use applymate_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason, TokenCount,
    ToolCall, Usage,
};

use super::provider::LlmProvider;

/// Requests seen by a [`ScriptedProvider`], shared with the test body.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<CompletionRequest>>>);

impl CallLog {
    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.0.lock().unwrap().clone()
    }
}

/// Returns queued results in order, then a fixed fallback response.
pub struct ScriptedProvider {
    name: String,
    capabilities: ProviderCapabilities,
    script: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    fallback: CompletionResponse,
    delay: Option<Duration>,
    calls: CallLog,
}

impl ScriptedProvider {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            capabilities: ProviderCapabilities {
                tool_calling: true,
                vision: true,
                max_context_tokens: 128_000,
                max_output_tokens: 4_096,
            },
            script: Mutex::new(VecDeque::new()),
            fallback: final_answer("done"),
            delay: None,
            calls: CallLog::default(),
        }
    }

    pub fn then_ok(self, response: CompletionResponse) -> Self {
        self.script.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn then_err(self, err: LlmError) -> Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    /// Response returned once the script is exhausted.
    pub fn otherwise(mut self, response: CompletionResponse) -> Self {
        self.fallback = response;
        self
    }

    /// Sleep before answering each call.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.0.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    async fn count_tokens(&self, request: &CompletionRequest) -> Result<TokenCount, LlmError> {
        Ok(TokenCount {
            input_tokens: request.estimated_tokens(),
        })
    }
}

pub fn final_answer(text: &str) -> CompletionResponse {
    CompletionResponse {
        id: "resp_final".into(),
        content: text.into(),
        model: "test-model".into(),
        stop_reason: StopReason::EndTurn,
        tool_calls: Vec::new(),
        usage: Usage::default(),
    }
}

/// A response requesting the given `(name, arguments)` tool calls, in order.
pub fn tool_calls(calls: &[(&str, &str)]) -> CompletionResponse {
    CompletionResponse {
        id: "resp_tools".into(),
        content: String::new(),
        model: "test-model".into(),
        stop_reason: StopReason::ToolUse,
        tool_calls: calls
            .iter()
            .enumerate()
            .map(|(i, (name, arguments))| ToolCall {
                id: format!("call_{i}"),
                name: (*name).to_string(),
                arguments: (*arguments).to_string(),
            })
            .collect(),
        usage: Usage::default(),
    }
}
