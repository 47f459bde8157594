//! Infrastructure layer for ApplyMate.
//!
//! Contains implementations of the traits defined in `applymate-core`: the
//! Groq model backend, the Google Sheets record store, plus the config
//! loader, environment secrets and the outbound chat transport.

pub mod config;
pub mod llm;
pub mod secret;
pub mod sheets;
pub mod store;
pub mod transport;
