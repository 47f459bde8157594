//! Shared domain types for ApplyMate.
//!
//! Job records, model request/response shapes, tool argument schemas,
//! configuration, and the error enums shared across crates.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, schemars.

pub mod config;
pub mod error;
pub mod job;
pub mod llm;
pub mod tool;
