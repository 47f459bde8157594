//! Inbound chat messages: filtering, the `/clear` command and the image path.
//!
//! The transport hands over a sender id, optional text and optional image
//! location. Images are turned into text by the [`ImageExtractor`] and then
//! resolved exactly like a typed message.

use std::sync::Arc;

use applymate_types::error::TurnError;

use crate::agent::coordinator::TurnCoordinator;
use crate::records::store::RecordStore;
use crate::vision::extractor::ImageExtractor;

pub const CLEAR_COMMAND: &str = "/clear";
pub const CLEARED_REPLY: &str = "✅ Your conversation history has been cleared. Starting fresh!";
pub const NOTHING_TO_CLEAR_REPLY: &str = "✅ No conversation history to clear. You can start chatting!";
pub const IMAGE_FAILURE_MESSAGE: &str = "Sorry, I had trouble processing the image. Please try again.";
pub const IMAGE_EMPTY_MESSAGE: &str = "I received an image but could not extract job details from it. Please try again or send the job details as text.";

const GROUP_SUFFIX: &str = "@g.us";
const CONTACT_SUFFIX: &str = "@c.us";

/// One message received from the chat transport.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    /// Sender chat id, e.g. `15551234567@c.us`.
    pub from: String,
    /// Message text, or the caption of an image.
    pub body: Option<String>,
    /// Sent by this service's own account.
    pub from_me: bool,
    /// Location of an attached image (`https:` or `data:` URL).
    pub image_url: Option<String>,
}

/// What to do with an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    Ignored,
    Reply {
        /// Chat id to answer on (the original sender id).
        chat_id: String,
        text: String,
    },
}

/// User identity for a sender id: the contact suffix is dropped.
pub fn user_id_for(sender: &str) -> String {
    sender.replace(CONTACT_SUFFIX, "")
}

/// Own messages and group chats are never answered.
pub fn accepts_sender(from: &str, from_me: bool) -> bool {
    !from_me && !from.contains(GROUP_SUFFIX)
}

/// Runs inbound messages through the coordinator.
pub struct InboundPipeline<S: RecordStore, E: ImageExtractor> {
    coordinator: Arc<TurnCoordinator<S>>,
    extractor: Arc<E>,
}

impl<S: RecordStore, E: ImageExtractor> InboundPipeline<S, E> {
    pub fn new(coordinator: Arc<TurnCoordinator<S>>, extractor: Arc<E>) -> Self {
        Self {
            coordinator,
            extractor,
        }
    }

    pub async fn handle(&self, message: &InboundMessage) -> Result<InboundOutcome, TurnError> {
        let body = message.body.as_deref().unwrap_or("").trim();

        if body.is_empty() && message.image_url.is_none() {
            return Ok(InboundOutcome::Ignored);
        }
        if !accepts_sender(&message.from, message.from_me) {
            tracing::debug!(from = %message.from, "Ignoring own or group message");
            return Ok(InboundOutcome::Ignored);
        }

        let user_id = user_id_for(&message.from);
        let reply = |text: String| InboundOutcome::Reply {
            chat_id: message.from.clone(),
            text,
        };

        if body.eq_ignore_ascii_case(CLEAR_COMMAND) {
            let text = if self.coordinator.clear_memory(&user_id) {
                CLEARED_REPLY
            } else {
                NOTHING_TO_CLEAR_REPLY
            };
            return Ok(reply(text.to_string()));
        }

        let text = match &message.image_url {
            Some(url) => self.describe_image(url, body).await,
            None => body.to_string(),
        };

        let answer = self.coordinator.resolve(&text, &user_id).await?;
        Ok(reply(answer))
    }

    /// The message to resolve in place of an image.
    async fn describe_image(&self, url: &str, caption: &str) -> String {
        match self.extractor.extract(url).await {
            Ok(extracted) if extracted.trim().is_empty() => IMAGE_EMPTY_MESSAGE.to_string(),
            Ok(extracted) => format!(
                "The job you are to save has been extracted: {extracted}\n\nURL: {caption}"
            ),
            Err(err) => {
                tracing::warn!(error = %err, "Image extraction failed");
                IMAGE_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use applymate_types::config::{AgentConfig, LlmConfig, UsageLimits};
    use applymate_types::error::ExtractionError;
    use tokio_util::sync::CancellationToken;

    use crate::agent::engine::{AgentLoop, LoopSettings};
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::credential_pool::CredentialPool;
    use crate::llm::testing::{CallLog, ScriptedProvider, final_answer};
    use crate::memory::conversation::ConversationStore;
    use crate::records::memory::InMemoryRecordStore;
    use crate::tools::set::ToolSet;

    enum FakeExtractor {
        Text(&'static str),
        Fails,
    }

    impl ImageExtractor for FakeExtractor {
        async fn extract(&self, _image_url: &str) -> Result<String, ExtractionError> {
            match self {
                FakeExtractor::Text(text) => Ok((*text).to_string()),
                FakeExtractor::Fails => Err(ExtractionError::RateLimited),
            }
        }
    }

    fn pipeline(
        extractor: FakeExtractor,
    ) -> (InboundPipeline<InMemoryRecordStore, FakeExtractor>, CallLog) {
        let provider = ScriptedProvider::named("p").otherwise(final_answer("reply"));
        let log = provider.calls();
        let pool = CredentialPool::new(vec![BoxLlmProvider::new(provider)], UsageLimits::default())
            .unwrap();
        let config = AgentConfig::default();
        let agent = AgentLoop::new(
            Arc::new(pool),
            Arc::new(ToolSet::new(InMemoryRecordStore::new())),
            LoopSettings::from_config(&LlmConfig::default(), &config),
        );
        let coordinator =
            TurnCoordinator::new(agent, ConversationStore::new(), &config, CancellationToken::new());
        (
            InboundPipeline::new(Arc::new(coordinator), Arc::new(extractor)),
            log,
        )
    }

    fn text(from: &str, body: &str) -> InboundMessage {
        InboundMessage {
            from: from.into(),
            body: Some(body.into()),
            ..Default::default()
        }
    }

    #[test]
    fn contact_suffix_is_stripped() {
        assert_eq!(user_id_for("15551234567@c.us"), "15551234567");
        assert_eq!(user_id_for("15551234567"), "15551234567");
    }

    #[test]
    fn own_and_group_senders_are_not_accepted() {
        assert!(accepts_sender("15551234567@c.us", false));
        assert!(!accepts_sender("15551234567@c.us", true));
        assert!(!accepts_sender("12345-678@g.us", false));
    }

    #[tokio::test]
    async fn ignores_group_own_and_empty_messages() {
        let (pipeline, log) = pipeline(FakeExtractor::Fails);

        let group = text("12345-678@g.us", "hi");
        let mut own = text("1555@c.us", "hi");
        own.from_me = true;
        let empty = text("1555@c.us", "   ");

        for message in [group, own, empty] {
            assert_eq!(pipeline.handle(&message).await.unwrap(), InboundOutcome::Ignored);
        }
        assert_eq!(log.count(), 0);
    }

    #[tokio::test]
    async fn text_is_resolved_for_stripped_user() {
        let (pipeline, log) = pipeline(FakeExtractor::Fails);
        let outcome = pipeline.handle(&text("1555@c.us", "show jobs")).await.unwrap();

        assert_eq!(
            outcome,
            InboundOutcome::Reply {
                chat_id: "1555@c.us".into(),
                text: "reply".into(),
            }
        );
        assert_eq!(log.requests()[0].messages[0].content, "show jobs");
        assert!(pipeline.coordinator.memory().contains("1555"));
    }

    #[tokio::test]
    async fn clear_command_reports_history_state() {
        let (pipeline, _) = pipeline(FakeExtractor::Fails);
        let clear = text("1555@c.us", " /CLEAR ");

        let InboundOutcome::Reply { text: first, .. } = pipeline.handle(&clear).await.unwrap() else {
            panic!("expected a reply");
        };
        assert_eq!(first, NOTHING_TO_CLEAR_REPLY);

        pipeline.handle(&text("1555@c.us", "hello")).await.unwrap();
        let InboundOutcome::Reply { text: second, .. } = pipeline.handle(&clear).await.unwrap() else {
            panic!("expected a reply");
        };
        assert_eq!(second, CLEARED_REPLY);
    }

    #[tokio::test]
    async fn image_is_described_with_caption() {
        let (pipeline, log) = pipeline(FakeExtractor::Text("- Job Title: SWE\n- Company Name: Acme"));
        let message = InboundMessage {
            from: "1555@c.us".into(),
            body: Some("https://acme.example/jobs/1".into()),
            image_url: Some("https://media.example/a.png".into()),
            ..Default::default()
        };
        pipeline.handle(&message).await.unwrap();

        assert_eq!(
            log.requests()[0].messages[0].content,
            "The job you are to save has been extracted: - Job Title: SWE\n- Company Name: Acme\n\nURL: https://acme.example/jobs/1"
        );
    }

    #[tokio::test]
    async fn failed_extraction_is_resolved_as_apology_text() {
        let (pipeline, log) = pipeline(FakeExtractor::Fails);
        let message = InboundMessage {
            from: "1555@c.us".into(),
            image_url: Some("https://media.example/a.png".into()),
            ..Default::default()
        };
        pipeline.handle(&message).await.unwrap();
        assert_eq!(log.requests()[0].messages[0].content, IMAGE_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn blank_extraction_asks_for_text() {
        let (pipeline, log) = pipeline(FakeExtractor::Text("  "));
        let message = InboundMessage {
            from: "1555@c.us".into(),
            image_url: Some("https://media.example/a.png".into()),
            ..Default::default()
        };
        pipeline.handle(&message).await.unwrap();
        assert_eq!(log.requests()[0].messages[0].content, IMAGE_EMPTY_MESSAGE);
    }
}
