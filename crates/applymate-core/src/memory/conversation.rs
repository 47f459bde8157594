//! Process-resident conversation transcripts, one per user.
//!
//! `ConversationStore` maps a user id to a [`TranscriptHandle`]: an
//! `Arc<tokio::sync::Mutex<Transcript>>`. The `DashMap` guard is released
//! before the handle is returned, so only the per-user async mutex is ever
//! held across an await. Holding that mutex for the length of a turn is what
//! serializes turns for one user.
//!
//! Nothing here trims a transcript; it grows until [`ConversationStore::clear`].
//! The bounded copy sent to the model is built by `agent::context`.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use applymate_types::llm::Message;

/// Ordered, append-only message history for one user.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Shared handle to one user's transcript.
pub type TranscriptHandle = Arc<Mutex<Transcript>>;

/// All users' transcripts. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    inner: Arc<DashMap<String, TranscriptHandle>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's handle, created empty on first access.
    pub fn get(&self, user_id: &str) -> TranscriptHandle {
        self.inner
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Transcript::new())))
            .value()
            .clone()
    }

    /// Drop the user's transcript. Returns true if one existed.
    ///
    /// A turn already running keeps its own handle; whatever it appends is
    /// discarded with it.
    pub fn clear(&self, user_id: &str) -> bool {
        let removed = self.inner.remove(user_id).is_some();
        if removed {
            tracing::info!(user = %user_id, "Conversation memory cleared");
        }
        removed
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.inner.contains_key(user_id)
    }

    /// Number of users with a transcript.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
