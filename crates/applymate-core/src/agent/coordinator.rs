//! Turn coordinator: the single entry point for resolving a user message.
//!
//! Validates input, serializes turns per user through the transcript mutex,
//! bounds each turn by a wall-clock timeout and the shutdown token, and maps
//! every failure to a fixed user-facing reply.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};

use applymate_types::config::AgentConfig;
use applymate_types::error::{AgentError, TurnError};
use applymate_types::llm::LlmError;

use crate::memory::conversation::ConversationStore;
use crate::records::store::RecordStore;

use super::engine::AgentLoop;

pub const TIMEOUT_REPLY: &str = "Sorry, that took too long to process. Please try asking your question in a simpler way or try again.";

pub const RECURSION_LIMIT_REPLY: &str = "I'm having trouble processing that. Please try a simpler question like:\n\
• \"Show me my jobs\"\n\
• \"What was the last job I applied to?\"\n\
• \"Did Amazon respond?\"";

pub const TOOL_USE_FAILED_REPLY: &str = "I had trouble understanding your request. Could you rephrase it? For example, try \"show me my jobs\" or \"what jobs did I apply to?\"";

pub const AUTHENTICATION_REPLY: &str =
    "I'm having trouble connecting to my AI service. Please contact support.";

pub const RATE_LIMIT_REPLY: &str =
    "I'm receiving too many requests right now. Please wait a moment and try again.";

pub const GENERIC_REPLY: &str = "Sorry, I encountered an error processing your request. Please try again or rephrase your message.";

/// The reply shown to the user for a failed turn.
pub fn apology_for(err: &TurnError) -> &'static str {
    match err {
        TurnError::Timeout(_) => TIMEOUT_REPLY,
        TurnError::Agent(AgentError::RecursionLimit { .. }) => RECURSION_LIMIT_REPLY,
        TurnError::Agent(AgentError::Llm(llm)) => match llm {
            LlmError::ToolUseFailed(_) => TOOL_USE_FAILED_REPLY,
            LlmError::AuthenticationFailed => AUTHENTICATION_REPLY,
            LlmError::RateLimited { .. } => RATE_LIMIT_REPLY,
            _ => GENERIC_REPLY,
        },
        TurnError::Agent(AgentError::EmptyResponse)
        | TurnError::Cancelled
        | TurnError::InvalidInput(_) => GENERIC_REPLY,
    }
}

/// Resolves inbound messages to replies, one turn at a time per user.
pub struct TurnCoordinator<S: RecordStore> {
    agent: AgentLoop<S>,
    memory: ConversationStore,
    turn_timeout: Duration,
    recursion_limit: usize,
    shutdown: CancellationToken,
}

impl<S: RecordStore> TurnCoordinator<S> {
    pub fn new(
        agent: AgentLoop<S>,
        memory: ConversationStore,
        config: &AgentConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            agent,
            memory,
            turn_timeout: Duration::from_secs(config.turn_timeout_secs),
            recursion_limit: config.recursion_limit,
            shutdown,
        }
    }

    pub fn memory(&self) -> &ConversationStore {
        &self.memory
    }

    /// Forget a user's conversation. Returns true if there was one.
    pub fn clear_memory(&self, user_id: &str) -> bool {
        self.memory.clear(user_id)
    }

    /// Resolve a message to the reply text.
    ///
    /// Only invalid input is an `Err`; every other failure becomes one of
    /// the fixed apology replies.
    pub async fn resolve(&self, message: &str, user_id: &str) -> Result<String, TurnError> {
        match self.try_resolve(message, user_id).await {
            Ok(answer) => Ok(answer),
            Err(err @ TurnError::InvalidInput(_)) => Err(err),
            Err(err) => {
                tracing::warn!(user = %user_id, error = %err, "Turn failed");
                Ok(apology_for(&err).to_string())
            }
        }
    }

    /// Resolve a message, surfacing the failure instead of an apology.
    pub async fn try_resolve(&self, message: &str, user_id: &str) -> Result<String, TurnError> {
        if user_id.trim().is_empty() {
            return Err(TurnError::InvalidInput("user id is required".to_string()));
        }
        if message.trim().is_empty() {
            return Err(TurnError::InvalidInput("message text is empty".to_string()));
        }

        let handle = self.memory.get(user_id);
        let span = info_span!("turn", user = %user_id);

        async move {
            let mut transcript = handle.lock().await;
            let started = Instant::now();

            let run = self
                .agent
                .run(&mut transcript, message, self.recursion_limit);

            let result = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Err(TurnError::Cancelled),
                outcome = tokio::time::timeout(self.turn_timeout, run) => match outcome {
                    Ok(Ok(answer)) => Ok(answer),
                    Ok(Err(err)) => Err(TurnError::Agent(err)),
                    Err(_) => Err(TurnError::Timeout(self.turn_timeout.as_secs())),
                },
            };

            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                ok = result.is_ok(),
                "Turn complete"
            );
            result
        }
        .instrument(span)
        .await
    }
}
