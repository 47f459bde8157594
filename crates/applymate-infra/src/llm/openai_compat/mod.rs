//! OpenAI-compatible provider -- concrete [`LlmProvider`] for Groq.
//!
//! Talks to `{base_url}/chat/completions` with plain `reqwest`. Request and
//! response conversion are pure functions so they can be tested without a
//! network; [`classify_error`] maps HTTP failures onto [`LlmError`] so the
//! credential pool can tell rate limits apart from everything else.

pub mod config;
pub mod types;

use secrecy::{ExposeSecret, SecretString};

use applymate_core::llm::provider::LlmProvider;
use applymate_observe::genai_attrs::{GEN_AI_PROVIDER_NAME, GEN_AI_RESPONSE_ID, GEN_AI_RESPONSE_MODEL};
use applymate_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, MessageRole, ProviderCapabilities,
    StopReason, TokenCount, ToolCall, Usage,
};

use self::config::OpenAiCompatConfig;
use self::types::{
    ChatFunction, ChatMessage, ChatRequest, ChatResponse, ChatTool, ContentPart, ErrorEnvelope,
    ImageUrl, MessageContent, WireFunctionCall, WireToolCall,
};

/// Provider for any backend speaking the OpenAI chat completions protocol.
///
/// One instance is bound to one API key. The key is only exposed when the
/// `Authorization` header is built.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    provider_name: String,
    base_url: String,
    api_key: SecretString,
    model: String,
    capabilities: ProviderCapabilities,
    request_timeout: std::time::Duration,
    vision_timeout: std::time::Duration,
}

// No Debug: the struct holds a credential.

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            provider_name: config.provider_name,
            base_url: config.base_url,
            api_key: config.api_key,
            model: config.model,
            capabilities: config.capabilities,
            request_timeout: config.request_timeout,
            vision_timeout: config.vision_timeout,
        })
    }

    /// Convenience constructor for Groq.
    pub fn groq(api_key: SecretString, model: &str) -> Result<Self, LlmError> {
        Self::new(config::groq_defaults(api_key, model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn timeout_for(&self, request: &CompletionRequest) -> std::time::Duration {
        if request.messages.iter().any(|m| !m.image_urls.is_empty()) {
            self.vision_timeout
        } else {
            self.request_timeout
        }
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = to_chat_request(request, &self.model);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .timeout(self.timeout_for(request))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &error_body, retry_after_ms));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let completion = from_chat_response(chat)?;

        let span = tracing::Span::current();
        span.record(GEN_AI_PROVIDER_NAME, self.provider_name.as_str());
        span.record(GEN_AI_RESPONSE_ID, completion.id.as_str());
        span.record(GEN_AI_RESPONSE_MODEL, completion.model.as_str());

        Ok(completion)
    }

    async fn count_tokens(&self, request: &CompletionRequest) -> Result<TokenCount, LlmError> {
        Ok(TokenCount {
            input_tokens: request.estimated_tokens(),
        })
    }
}

/// Convert a [`CompletionRequest`] into the wire request.
///
/// The system prompt becomes a leading `system` message. An empty request
/// model falls back to `default_model`.
pub fn to_chat_request(request: &CompletionRequest, default_model: &str) -> ChatRequest {
    let model = if request.model.is_empty() {
        default_model.to_string()
    } else {
        request.model.clone()
    };

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = &request.system {
        messages.push(ChatMessage {
            role: MessageRole::System.to_string(),
            content: Some(MessageContent::Text(system.clone())),
            tool_calls: Vec::new(),
            tool_call_id: None,
        });
    }
    messages.extend(request.messages.iter().map(to_chat_message));

    let tools = request
        .tools
        .iter()
        .map(|tool| ChatTool {
            kind: "function",
            function: ChatFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        })
        .collect::<Vec<_>>();

    let tool_choice = if tools.is_empty() {
        None
    } else {
        request.tool_choice.map(|choice| choice.to_string())
    };

    ChatRequest {
        model,
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        tools,
        tool_choice,
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let content = if !message.image_urls.is_empty() {
        let mut parts = vec![ContentPart::Text {
            text: message.content.clone(),
        }];
        parts.extend(message.image_urls.iter().map(|url| ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.clone() },
        }));
        Some(MessageContent::Parts(parts))
    } else if message.has_tool_calls() && message.content.is_empty() {
        None
    } else {
        Some(MessageContent::Text(message.content.clone()))
    };

    ChatMessage {
        role: message.role.to_string(),
        content,
        tool_calls: message
            .tool_calls
            .iter()
            .map(|call| WireToolCall {
                id: call.id.clone(),
                kind: "function".to_string(),
                function: WireFunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            })
            .collect(),
        tool_call_id: message.tool_call_id.clone(),
    }
}

/// Convert the wire response into a [`CompletionResponse`].
///
/// Only the first choice is read. Tool calls without an id get a positional
/// one so results can still be paired with their calls.
pub fn from_chat_response(response: ChatResponse) -> Result<CompletionResponse, LlmError> {
    let ChatResponse {
        id,
        model,
        choices,
        usage,
    } = response;

    let choice = choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Deserialization("response has no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| ToolCall {
            id: if call.id.is_empty() {
                format!("call_{index}")
            } else {
                call.id
            },
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect::<Vec<_>>();

    let stop_reason = if !tool_calls.is_empty() {
        StopReason::ToolUse
    } else {
        match choice.finish_reason.as_deref() {
            Some("length") => StopReason::MaxTokens,
            Some("tool_calls") => StopReason::ToolUse,
            _ => StopReason::EndTurn,
        }
    };

    let usage = usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id,
        content: choice.message.content.unwrap_or_default(),
        model,
        stop_reason,
        tool_calls,
        usage,
    })
}

/// Map a non-success HTTP status and body onto [`LlmError`].
pub fn classify_error(status: u16, body: &str, retry_after_ms: Option<u64>) -> LlmError {
    let (message, kind, code) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (
            envelope.error.message,
            envelope.error.kind.unwrap_or_default(),
            envelope.error.code.unwrap_or_default(),
        ),
        Err(_) => (body.to_string(), String::new(), String::new()),
    };
    let lowered = message.to_lowercase();

    if status == 401 || code == "invalid_api_key" {
        LlmError::AuthenticationFailed
    } else if status == 429 || code == "rate_limit_exceeded" || lowered.contains("rate limit") {
        LlmError::RateLimited { retry_after_ms }
    } else if code == "tool_use_failed" {
        LlmError::ToolUseFailed(message)
    } else if code == "context_length_exceeded" || lowered.contains("context length") {
        LlmError::ContextLengthExceeded {
            max: 0,
            requested: 0,
        }
    } else if status >= 500 || kind == "overloaded_error" {
        LlmError::Overloaded(message)
    } else if status == 400 || status == 422 {
        LlmError::InvalidRequest(message)
    } else {
        LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        }
    }
}

/// `Retry-After` in seconds (fractions allowed) to milliseconds.
fn parse_retry_after(value: &str) -> Option<u64> {
    let secs: f64 = value.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| (secs * 1000.0).ceil() as u64)
}
