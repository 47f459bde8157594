//! Credential pool statistics.
//!
//! GET /api/v1/credentials - Per-credential usage against the configured limits.

use axum::extract::State;

use applymate_core::llm::credential_pool::CredentialStats;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

pub async fn list_credentials(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<CredentialStats>>, AppError> {
    let timer = RequestTimer::start();
    Ok(timer.finish(state.pool.stats()))
}
