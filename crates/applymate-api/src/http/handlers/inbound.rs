//! Inbound chat messages from the transport bridge.
//!
//! POST /api/v1/messages/inbound - Run a received message through the
//! inbound pipeline and, when a transport is configured, send the reply back.

use std::path::Path;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use applymate_core::inbound::{IMAGE_FAILURE_MESSAGE, InboundMessage, InboundOutcome, accepts_sender};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::media::{media_url, store_base64_image};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InboundRequest {
    pub from: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InboundReply {
    /// `None` when the message was ignored.
    pub reply: Option<String>,
    /// Whether the reply was handed to the outbound transport.
    pub delivered: bool,
}

pub async fn receive_message(
    State(state): State<AppState>,
    Json(request): Json<InboundRequest>,
) -> Result<ApiResponse<InboundReply>, AppError> {
    let timer = RequestTimer::start();
    if request.from.trim().is_empty() {
        return Err(AppError::Validation("from is required".into()));
    }

    let message = to_inbound_message(&state.media_dir, &state.config.server.base_url, request).await;
    let outcome = state.inbound.handle(&message).await?;

    let InboundOutcome::Reply { chat_id, text } = outcome else {
        return Ok(timer.finish(InboundReply {
            reply: None,
            delivered: false,
        }));
    };

    let mut delivered = false;
    if state.transport.is_ready() {
        match state.transport.send_text(&chat_id, &text).await {
            Ok(_) => delivered = true,
            Err(err) => tracing::warn!(chat_id = %chat_id, error = %err, "Failed to deliver reply"),
        }
    }

    Ok(timer.finish(InboundReply {
        reply: Some(text),
        delivered,
    }))
}

/// Base64 images are stored under the media directory and referenced by URL.
/// Nothing is written for senders the pipeline will ignore.
async fn to_inbound_message(media_dir: &Path, base_url: &str, request: InboundRequest) -> InboundMessage {
    let InboundRequest {
        from,
        body,
        from_me,
        image_url,
        image_base64,
        mimetype,
        caption,
    } = request;

    if !accepts_sender(&from, from_me) {
        return InboundMessage {
            from,
            body,
            from_me,
            image_url: None,
        };
    }

    let is_image = image_url.is_some() || image_base64.is_some();
    let text = if is_image { caption.or(body) } else { body };

    let (text, image_url) = match image_base64 {
        Some(data) => match store_base64_image(media_dir, &data, mimetype.as_deref(), None).await {
            Ok(name) => {
                let url = media_url(base_url, media_dir, &media_dir.join(name));
                (text, Some(url))
            }
            Err(err) => {
                tracing::warn!(from = %from, error = %err, "Failed to store inbound image");
                (Some(IMAGE_FAILURE_MESSAGE.to_string()), None)
            }
        },
        None => (text, image_url),
    };

    InboundMessage {
        from,
        body: text,
        from_me,
        image_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BASE_URL: &str = "http://localhost:3000";

    fn image_request(from: &str, from_me: bool) -> InboundRequest {
        InboundRequest {
            from: from.into(),
            body: None,
            from_me,
            image_url: None,
            image_base64: Some("data:image/gif;base64,R0lGODlh".into()),
            mimetype: None,
            caption: Some("https://jobs.example/42".into()),
        }
    }

    async fn media_dir() -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let dir = tokio::fs::canonicalize(tmp.path()).await.unwrap();
        (tmp, dir)
    }

    async fn file_count(dir: &Path) -> usize {
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }

    #[tokio::test]
    async fn ignored_senders_write_no_media() {
        let (_tmp, dir) = media_dir().await;

        let group = to_inbound_message(&dir, BASE_URL, image_request("12345-678@g.us", false)).await;
        assert!(group.image_url.is_none());
        let own = to_inbound_message(&dir, BASE_URL, image_request("1555@c.us", true)).await;
        assert!(own.image_url.is_none());

        assert_eq!(file_count(&dir).await, 0);
    }

    #[tokio::test]
    async fn accepted_image_is_stored_and_linked() {
        let (_tmp, dir) = media_dir().await;

        let message = to_inbound_message(&dir, BASE_URL, image_request("1555@c.us", false)).await;
        let url = message.image_url.unwrap();
        assert!(url.starts_with("http://localhost:3000/media/"));
        assert!(url.ends_with(".gif"));
        assert_eq!(message.body.as_deref(), Some("https://jobs.example/42"));
        assert_eq!(file_count(&dir).await, 1);
    }

    #[tokio::test]
    async fn undecodable_image_becomes_failure_message() {
        let (_tmp, dir) = media_dir().await;
        let mut request = image_request("1555@c.us", false);
        request.image_base64 = Some("not base64!!".into());

        let message = to_inbound_message(&dir, BASE_URL, request).await;
        assert!(message.image_url.is_none());
        assert_eq!(message.body.as_deref(), Some(IMAGE_FAILURE_MESSAGE));
        assert_eq!(file_count(&dir).await, 0);
    }
}
