//! Working-transcript trimming.
//!
//! The memory store keeps a user's full history; only the copy handed to the
//! model is trimmed. Above `threshold` messages the working transcript keeps a
//! leading system message, if any, plus the most recent messages, `keep` in
//! total. Tool results whose assistant request fell off the front are then
//! dropped so the model never sees an unanswered result.
//!
//! Stored transcripts are unbounded: they grow for the life of the process
//! until the user clears them.

use applymate_types::llm::{Message, MessageRole};

/// Trim bounds for the working transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPolicy {
    pub threshold: usize,
    pub keep: usize,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self {
            threshold: 18,
            keep: 15,
        }
    }
}

impl TrimPolicy {
    /// The messages to send to the model for `history`.
    pub fn working_transcript(&self, history: &[Message]) -> Vec<Message> {
        if history.len() <= self.threshold {
            return history.to_vec();
        }

        let leading_system = history
            .first()
            .filter(|m| m.role == MessageRole::System)
            .cloned();
        let recent_count = self
            .keep
            .saturating_sub(usize::from(leading_system.is_some()));

        let recent = &history[history.len().saturating_sub(recent_count)..];
        let first_kept = recent
            .iter()
            .position(|m| m.role != MessageRole::Tool)
            .unwrap_or(recent.len());

        let dropped = history.len() - recent.len() + first_kept;
        tracing::debug!(
            total = history.len(),
            dropped,
            "Trimmed working transcript"
        );

        leading_system
            .into_iter()
            .chain(recent[first_kept..].iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use applymate_types::llm::ToolCall;

    fn conversation(turns: usize) -> Vec<Message> {
        (0..turns)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {i}"))
                } else {
                    Message::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn short_history_is_untouched() {
        let history = conversation(18);
        assert_eq!(TrimPolicy::default().working_transcript(&history), history);
    }

    #[test]
    fn twenty_turns_trim_to_fifteen_most_recent() {
        let history = conversation(20);
        let working = TrimPolicy::default().working_transcript(&history);
        assert_eq!(working.len(), 15);
        assert_eq!(working.first().unwrap().content, "answer 5");
        assert_eq!(working.last().unwrap().content, "answer 19");
    }

    #[test]
    fn leading_system_turn_is_kept() {
        let mut history = vec![Message::system("rules")];
        history.extend(conversation(19));
        let working = TrimPolicy::default().working_transcript(&history);
        assert_eq!(working.len(), 15);
        assert_eq!(working[0].role, MessageRole::System);
        assert_eq!(working[1].content, "answer 5");
        assert_eq!(working.last().unwrap().content, "question 18");
    }

    #[test]
    fn orphaned_tool_results_are_dropped() {
        let mut history = conversation(14);
        history.push(Message::user("list my jobs"));
        history.push(Message::assistant_tool_calls(
            "",
            vec![
                ToolCall {
                    id: "a".into(),
                    name: "getJobs".into(),
                    arguments: "{}".into(),
                },
                ToolCall {
                    id: "b".into(),
                    name: "searchJobs".into(),
                    arguments: r#"{"query":"acme"}"#.into(),
                },
            ],
        ));
        history.push(Message::tool_result("a", "jobs"));
        history.push(Message::tool_result("b", "acme jobs"));
        history.extend(conversation(13));
        assert_eq!(history.len(), 31);

        // The newest 15 start at the first tool result.
        let working = TrimPolicy::default().working_transcript(&history);
        assert_eq!(working.len(), 13);
        assert!(working.iter().all(|m| m.role != MessageRole::Tool));
    }
}
