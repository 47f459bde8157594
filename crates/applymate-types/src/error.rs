//! Error types shared across ApplyMate crates.

use crate::llm::LlmError;

/// Errors from the tabular record store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store connection error: {0}")]
    Connection(String),

    #[error("record store request failed: {0}")]
    Request(String),

    #[error("record store authentication failed: {0}")]
    Authentication(String),

    #[error("row not found: {0}")]
    RowNotFound(usize),

    #[error("malformed record store response: {0}")]
    Malformed(String),
}

/// Errors raised while dispatching a model-requested tool call.
///
/// These never cross the tool-set boundary as errors; they are rendered into
/// the textual tool result the model sees.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Invalid input for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

/// Failures that abort one run of the agent loop.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("recursion limit of {limit} steps reached without a final answer")]
    RecursionLimit { limit: usize },

    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Failures of one inbound turn as seen by the turn coordinator.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// Missing user id or empty message; rejected before any work starts.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("turn timed out after {0}s")]
    Timeout(u64),

    #[error("turn cancelled by shutdown")]
    Cancelled,

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Failures of the image-to-text extractor.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Rate limit reached. Please wait a moment before sending another image.")]
    RateLimited,

    #[error("Unable to process this image. Please ensure it's a valid job posting screenshot.")]
    InvalidImage(String),

    #[error("Failed to analyze image: {0}")]
    Other(String),
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_message_names_tool() {
        let err = ToolError::InvalidArguments {
            tool: "saveJob".into(),
            message: "companyName must not be empty".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid input for saveJob: companyName must not be empty"
        );
    }

    #[test]
    fn agent_error_wraps_llm_error() {
        let err: AgentError = LlmError::AuthenticationFailed.into();
        assert!(matches!(err, AgentError::Llm(LlmError::AuthenticationFailed)));
    }

    #[test]
    fn turn_error_wraps_agent_error() {
        let err: TurnError = AgentError::RecursionLimit { limit: 25 }.into();
        assert!(err.to_string().contains("25"));
    }

    #[test]
    fn extraction_errors_are_user_readable() {
        assert!(ExtractionError::RateLimited.to_string().starts_with("Rate limit reached"));
        assert!(
            ExtractionError::Other("boom".into())
                .to_string()
                .starts_with("Failed to analyze image")
        );
    }
}
