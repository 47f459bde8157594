//! Conversation memory endpoint.
//!
//! DELETE /api/v1/users/{user_id}/memory - Forget a user's transcript.

use axum::extract::{Path, State};
use serde::Serialize;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClearedMemory {
    pub user_id: String,
    /// Whether a transcript existed.
    pub cleared: bool,
}

pub async fn clear_memory(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<ClearedMemory>, AppError> {
    let timer = RequestTimer::start();
    if user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id is required".into()));
    }
    let cleared = state.coordinator.clear_memory(&user_id);
    Ok(timer.finish(ClearedMemory { user_id, cleared }))
}
