//! The agent loop: model call, tool calls, repeat until a final answer.
//!
//! One run is a small state machine:
//! `Prompting -> ModelCall -> {ToolCall -> Prompting -> ModelCall}* -> Done`.
//! Each model call and each tool round costs one step against the budget the
//! caller hands in; running out is [`AgentError::RecursionLimit`].
//!
//! The user message is committed to the transcript on entry. An assistant
//! tool-call turn is committed only together with all of its results, so an
//! abandoned run never leaves an unanswered request in memory.

use std::sync::Arc;

use tracing::{Instrument, field, info_span};

use applymate_types::config::{AgentConfig, LlmConfig};
use applymate_types::error::AgentError;
use applymate_types::llm::{CompletionRequest, CompletionResponse, Message, ToolCall, ToolChoice};

use crate::llm::credential_pool::CredentialPool;
use crate::memory::conversation::Transcript;
use crate::records::store::RecordStore;
use crate::tools::set::ToolSet;

use super::context::TrimPolicy;
use super::prompt::SystemPromptBuilder;
use super::repeat_guard::{RepeatCheck, RepeatGuard};

/// Model and policy settings for the loop.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub trim: TrimPolicy,
    pub max_rate_limit_retries: usize,
    pub max_identical_tool_calls: usize,
}

impl LoopSettings {
    pub fn from_config(llm: &LlmConfig, agent: &AgentConfig) -> Self {
        Self {
            model: llm.text_model.clone(),
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            trim: TrimPolicy {
                threshold: agent.trim_threshold,
                keep: agent.trim_keep,
            },
            max_rate_limit_retries: agent.max_rate_limit_retries,
            max_identical_tool_calls: agent.max_identical_tool_calls,
        }
    }
}

enum LoopState {
    Prompting,
    ModelCall(CompletionRequest),
    ToolCall { content: String, calls: Vec<ToolCall> },
    Done(String),
}

/// Drives one user turn against the model and the tool set.
pub struct AgentLoop<S: RecordStore> {
    pool: Arc<CredentialPool>,
    tools: Arc<ToolSet<S>>,
    settings: LoopSettings,
}

impl<S: RecordStore> AgentLoop<S> {
    pub fn new(pool: Arc<CredentialPool>, tools: Arc<ToolSet<S>>, settings: LoopSettings) -> Self {
        Self {
            pool,
            tools,
            settings,
        }
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Run one turn and return the final answer.
    ///
    /// `step_limit` bounds model calls plus tool rounds.
    pub async fn run(
        &self,
        transcript: &mut Transcript,
        user_message: &str,
        step_limit: usize,
    ) -> Result<String, AgentError> {
        transcript.push(Message::user(user_message));

        let mut guard = RepeatGuard::new(self.settings.max_identical_tool_calls);
        let mut steps = 0usize;
        let mut state = LoopState::Prompting;

        loop {
            state = match state {
                LoopState::Prompting => LoopState::ModelCall(self.build_request(transcript)),

                LoopState::ModelCall(request) => {
                    take_step(&mut steps, step_limit)?;
                    let response = self.call_model(&request).await?;

                    if response.tool_calls.is_empty() {
                        if response.content.trim().is_empty() {
                            return Err(AgentError::EmptyResponse);
                        }
                        LoopState::Done(response.content)
                    } else {
                        LoopState::ToolCall {
                            content: response.content,
                            calls: response.tool_calls,
                        }
                    }
                }

                LoopState::ToolCall { content, calls } => {
                    take_step(&mut steps, step_limit)?;

                    let mut results = Vec::with_capacity(calls.len());
                    for call in &calls {
                        let output = match guard.check_and_register(call) {
                            RepeatCheck::Allowed => {
                                tracing::debug!(tool = %call.name, "Executing tool call");
                                self.tools.execute(call).await
                            }
                            RepeatCheck::Repeated { notice } => notice,
                        };
                        results.push(Message::tool_result(call.id.clone(), output));
                    }

                    transcript.push(Message::assistant_tool_calls(content, calls));
                    transcript.extend(results);
                    LoopState::Prompting
                }

                LoopState::Done(answer) => {
                    tracing::debug!(steps, "Turn finished");
                    transcript.push(Message::assistant(answer.clone()));
                    return Ok(answer);
                }
            };
        }
    }

    fn build_request(&self, transcript: &Transcript) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: self.settings.trim.working_transcript(transcript.messages()),
            system: Some(SystemPromptBuilder::build(chrono::Local::now().date_naive())),
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
            tools: self.tools.definitions(),
            tool_choice: Some(ToolChoice::Auto),
        }
    }

    async fn call_model(&self, request: &CompletionRequest) -> Result<CompletionResponse, AgentError> {
        let span = info_span!(
            "gen_ai.chat",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = field::Empty,
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.response.id = field::Empty,
            gen_ai.response.model = field::Empty,
            gen_ai.response.finish_reasons = field::Empty,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
            credential = field::Empty,
            attempts = field::Empty,
        );

        let completion = self
            .pool
            .complete(request, self.settings.max_rate_limit_retries)
            .instrument(span.clone())
            .await?;

        span.record("credential", completion.credential.as_str());
        span.record("attempts", completion.attempts);
        let finish_reason = completion.response.stop_reason.to_string();
        span.record("gen_ai.response.finish_reasons", finish_reason.as_str());
        span.record("gen_ai.usage.input_tokens", completion.response.usage.input_tokens);
        span.record("gen_ai.usage.output_tokens", completion.response.usage.output_tokens);

        Ok(completion.response)
    }
}

fn take_step(steps: &mut usize, limit: usize) -> Result<(), AgentError> {
    if *steps >= limit {
        tracing::warn!(limit, "Step budget exhausted");
        return Err(AgentError::RecursionLimit { limit });
    }
    *steps += 1;
    Ok(())
}
