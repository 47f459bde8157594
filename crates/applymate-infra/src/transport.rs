//! Outbound chat transport.
//!
//! Replies and directed sends are POSTed as JSON to a webhook that bridges
//! to the messaging channel. Without a configured URL the transport reports
//! not ready and every send fails with [`TransportError::NotConfigured`].

use serde::{Deserialize, Serialize};

use applymate_types::config::TransportConfig;

const CONTACT_SUFFIX: &str = "@c.us";
const GROUP_SUFFIX: &str = "@g.us";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("chat transport is not configured")]
    NotConfigured,

    #[error("Invalid number parameter: must be a non-empty string")]
    InvalidRecipient,

    #[error("transport request failed: {0}")]
    Request(String),

    #[error("transport rejected message: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Payload POSTed to the webhook.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text {
        to: String,
        text: String,
    },
    Image {
        to: String,
        image_url: String,
        #[serde(skip_serializing_if = "String::is_empty")]
        caption: String,
    },
}

impl OutboundMessage {
    pub fn recipient(&self) -> &str {
        match self {
            OutboundMessage::Text { to, .. } | OutboundMessage::Image { to, .. } => to,
        }
    }
}

/// What the webhook reported back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    #[serde(default)]
    pub message_id: Option<String>,
    pub to: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookReply {
    #[serde(default, alias = "messageId", alias = "id")]
    message_id: Option<String>,
}

/// Chat id for a phone number: contact and group ids pass through, bare
/// numbers get the contact suffix.
pub fn format_chat_id(number: &str) -> Result<String, TransportError> {
    let number = number.trim();
    if number.is_empty() {
        return Err(TransportError::InvalidRecipient);
    }
    if number.contains(CONTACT_SUFFIX) || number.contains(GROUP_SUFFIX) {
        return Ok(number.to_string());
    }
    Ok(format!("{number}{CONTACT_SUFFIX}"))
}

pub struct WebhookTransport {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Request(format!("failed to create HTTP client: {e}")))?;
        let url = config
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        Ok(Self { client, url })
    }

    pub fn is_ready(&self) -> bool {
        self.url.is_some()
    }

    pub async fn send_text(&self, chat_id: &str, text: &str) -> Result<SendReceipt, TransportError> {
        self.send(OutboundMessage::Text {
            to: chat_id.to_string(),
            text: text.to_string(),
        })
        .await
    }

    pub async fn send_image(
        &self,
        chat_id: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<SendReceipt, TransportError> {
        self.send(OutboundMessage::Image {
            to: chat_id.to_string(),
            image_url: image_url.to_string(),
            caption: caption.to_string(),
        })
        .await
    }

    pub async fn send(&self, message: OutboundMessage) -> Result<SendReceipt, TransportError> {
        let url = self.url.as_deref().ok_or(TransportError::NotConfigured)?;

        let response = self
            .client
            .post(url)
            .json(&message)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::warn!(%status, to = message.recipient(), "Transport rejected message");
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let reply: WebhookReply = serde_json::from_str(&body).unwrap_or_default();
        tracing::debug!(to = message.recipient(), "Message handed to transport");
        Ok(SendReceipt {
            message_id: reply.message_id,
            to: message.recipient().to_string(),
            timestamp: chrono::Utc::now(),
        })
    }
}
