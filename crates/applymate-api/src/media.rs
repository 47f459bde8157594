//! Media files under `server.media_dir`.
//!
//! Images that arrive as base64 are written here and served back from
//! `/media/...`, so the vision model and the chat transport can fetch them
//! by URL. Caller-supplied paths must resolve inside the directory.

use std::path::{Component, Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Path is not a file: {0}")]
    NotAFile(String),

    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(String),

    #[error("failed to write media file: {0}")]
    Io(#[from] std::io::Error),
}

/// File extension (with dot) for an image, from its filename or mimetype.
pub fn extension_for(mimetype: Option<&str>, filename: Option<&str>) -> String {
    if let Some(ext) = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        return format!(".{}", ext.to_lowercase());
    }

    match mimetype.map(|m| m.trim().to_lowercase()).as_deref() {
        Some("image/jpeg") | Some("image/jpg") => ".jpg",
        Some("image/gif") => ".gif",
        Some("image/webp") => ".webp",
        _ => ".png",
    }
    .to_string()
}

/// Resolve a caller-supplied path to an existing file inside `media_dir`.
///
/// `media_dir` must already be canonical. Relative paths are taken relative
/// to it. `..` components and `~` are rejected before touching the disk, and
/// the canonical result must still lie under `media_dir` (symlinks).
pub async fn validate_media_path(media_dir: &Path, requested: &str) -> Result<PathBuf, MediaError> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Err(MediaError::InvalidPath("must be a non-empty string".into()));
    }

    let candidate = Path::new(requested);
    if requested.contains('~') || candidate.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(MediaError::InvalidPath("directory traversal not allowed".into()));
    }

    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        media_dir.join(candidate)
    };

    let resolved = tokio::fs::canonicalize(&joined)
        .await
        .map_err(|_| MediaError::NotFound(requested.to_string()))?;
    if !resolved.starts_with(media_dir) {
        return Err(MediaError::InvalidPath(
            "access outside allowed directory not permitted".into(),
        ));
    }

    let metadata = tokio::fs::metadata(&resolved).await?;
    if !metadata.is_file() {
        return Err(MediaError::NotAFile(requested.to_string()));
    }
    Ok(resolved)
}

/// Decode a base64 image (optionally a `data:` URL) and write it under
/// `media_dir`. Returns the new file's name.
pub async fn store_base64_image(
    media_dir: &Path,
    data: &str,
    mimetype: Option<&str>,
    filename: Option<&str>,
) -> Result<String, MediaError> {
    let (data_mime, payload) = split_data_url(data);
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| MediaError::InvalidBase64(e.to_string()))?;
    if bytes.is_empty() {
        return Err(MediaError::InvalidBase64("empty payload".into()));
    }

    let extension = extension_for(mimetype.or(data_mime), filename);
    let name = format!(
        "{}-{}{extension}",
        chrono::Utc::now().timestamp_millis(),
        &uuid::Uuid::now_v7().simple().to_string()[16..]
    );
    tokio::fs::write(media_dir.join(&name), &bytes).await?;
    tracing::debug!(file = %name, bytes = bytes.len(), "Stored media file");
    Ok(name)
}

/// `data:image/png;base64,AAAA` to (`Some("image/png")`, `AAAA`).
fn split_data_url(data: &str) -> (Option<&str>, &str) {
    data.strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(mime, payload)| (Some(mime), payload))
        .unwrap_or((None, data))
}

/// Public URL of a file under `media_dir`.
pub fn media_url(base_url: &str, media_dir: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(media_dir).unwrap_or(file);
    let path = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/media/{path}", base_url.trim_end_matches('/'))
}
