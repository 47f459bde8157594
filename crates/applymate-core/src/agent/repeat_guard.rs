//! Repeated tool-call breaker.
//!
//! Within one turn, each tool call is reduced to a signature (tool name plus
//! canonicalized arguments) and counted. Once a signature has run
//! `max_identical` times, further copies are skipped and the model is handed
//! a notice instead of a fresh result.

use std::collections::HashMap;

use applymate_types::llm::ToolCall;

/// Outcome of registering a tool call with the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatCheck {
    /// Execute the call.
    Allowed,
    /// Skip the call and return `notice` as its result.
    Repeated { notice: String },
}

/// Per-turn counter of tool-call signatures.
#[derive(Debug)]
pub struct RepeatGuard {
    seen: HashMap<(String, String), usize>,
    max_identical: usize,
}

impl RepeatGuard {
    pub fn new(max_identical: usize) -> Self {
        Self {
            seen: HashMap::new(),
            max_identical: max_identical.max(1),
        }
    }

    pub fn check_and_register(&mut self, call: &ToolCall) -> RepeatCheck {
        let count = self.seen.entry(signature(call)).or_insert(0);
        *count += 1;

        if *count > self.max_identical {
            tracing::warn!(
                tool = %call.name,
                count = *count,
                threshold = self.max_identical,
                "Skipping repeated tool call"
            );
            RepeatCheck::Repeated {
                notice: format!(
                    "{} was already called with these arguments in this turn. \
                     Do not call it again; answer the user from the earlier result.",
                    call.name
                ),
            }
        } else {
            RepeatCheck::Allowed
        }
    }
}

/// Tool name and canonical arguments. Arguments are re-serialized through
/// `serde_json::Value` so key order and whitespace do not matter, then
/// lowercased.
fn signature(call: &ToolCall) -> (String, String) {
    let raw = call.arguments.trim();
    let arguments = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Null) => "{}".to_string(),
        Ok(value) => value.to_string(),
        Err(_) if raw.is_empty() => "{}".to_string(),
        Err(_) => raw.to_string(),
    };

    (call.name.clone(), arguments.to_lowercase())
}
