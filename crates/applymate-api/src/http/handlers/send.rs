//! Directed sends through the outbound transport.
//!
//! POST /api/v1/send-message - Send a text message to a number.
//! POST /api/v1/send-image   - Send an image (URL, base64 or media file).

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use applymate_infra::transport::{SendReceipt, format_chat_id};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::media::{media_url, store_base64_image, validate_media_path};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendImageRequest {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Where the image to send comes from.
#[derive(Debug, PartialEq, Eq)]
pub enum ImageSource<'a> {
    Url(&'a str),
    Base64(&'a str),
    File(&'a str),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Exactly one of `image_url`, `image_base64`, `file_path`.
pub fn image_source(request: &SendImageRequest) -> Result<ImageSource<'_>, AppError> {
    let sources: Vec<ImageSource<'_>> = [
        present(&request.image_url).map(ImageSource::Url),
        present(&request.image_base64).map(ImageSource::Base64),
        present(&request.file_path).map(ImageSource::File),
    ]
    .into_iter()
    .flatten()
    .collect();

    match sources.len() {
        0 => Err(AppError::Validation(
            "Either image_url, image_base64, or file_path is required".into(),
        )),
        1 => Ok(sources.into_iter().next().ok_or_else(|| {
            AppError::Internal("image source disappeared".into())
        })?),
        _ => Err(AppError::Validation(
            "Provide only one of image_url, image_base64, or file_path".into(),
        )),
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<ApiResponse<SendReceipt>, AppError> {
    let timer = RequestTimer::start();
    let (Some(number), Some(message)) = (present(&request.number), present(&request.message)) else {
        return Err(AppError::Validation("Both number and message are required".into()));
    };
    if !state.transport.is_ready() {
        return Err(AppError::Unavailable("Chat transport is not ready yet".into()));
    }

    let chat_id = format_chat_id(number)?;
    let receipt = state.transport.send_text(&chat_id, message).await?;
    tracing::info!(to = %receipt.to, "Sent directed message");
    Ok(timer.finish(receipt))
}

pub async fn send_image(
    State(state): State<AppState>,
    Json(request): Json<SendImageRequest>,
) -> Result<ApiResponse<SendReceipt>, AppError> {
    let timer = RequestTimer::start();
    let Some(number) = present(&request.number) else {
        return Err(AppError::Validation("Number is required".into()));
    };
    let source = image_source(&request)?;
    if !state.transport.is_ready() {
        return Err(AppError::Unavailable("Chat transport is not ready yet".into()));
    }

    let chat_id = format_chat_id(number)?;
    let base_url = &state.config.server.base_url;
    let url = match source {
        ImageSource::Url(url) => url.to_string(),
        ImageSource::File(path) => {
            let file = validate_media_path(&state.media_dir, path).await?;
            media_url(base_url, &state.media_dir, &file)
        }
        ImageSource::Base64(data) => {
            let name = store_base64_image(
                &state.media_dir,
                data,
                request.mimetype.as_deref(),
                request.filename.as_deref(),
            )
            .await?;
            media_url(base_url, &state.media_dir, &state.media_dir.join(name))
        }
    };

    let caption = request.caption.as_deref().unwrap_or("");
    let receipt = state.transport.send_image(&chat_id, &url, caption).await?;
    tracing::info!(to = %receipt.to, "Sent directed image");
    Ok(timer.finish(receipt))
}
