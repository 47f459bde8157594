//! HTTP API layer for ApplyMate.
//!
//! Axum router at `/api/v1/` with the envelope response format, plus the
//! bare `/health` probe and static `/media` files.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
