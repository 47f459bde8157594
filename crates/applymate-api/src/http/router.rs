//! Axum router configuration with middleware.
//!
//! API routes live under `/api/v1/`; `/health` and `/media/*` sit at the
//! root. Middleware: CORS, tracing.

use axum::Router;
use axum::extract::State;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Inbound chat messages
        .route("/messages/inbound", post(handlers::inbound::receive_message))
        // Direct turns
        .route("/chat", post(handlers::chat::chat))
        .route("/users/{user_id}/memory", delete(handlers::memory::clear_memory))
        // Credential pool
        .route("/credentials", get(handlers::credentials::list_credentials))
        // Directed sends
        .route("/send-message", post(handlers::send::send_message))
        .route("/send-image", post(handlers::send::send_image));

    let media = ServeDir::new(&state.media_dir);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .nest_service("/media", media)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness and transport readiness.
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "transport_ready": state.transport.is_ready(),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
