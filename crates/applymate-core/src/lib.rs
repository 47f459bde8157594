//! Business logic and port traits for ApplyMate.
//!
//! This crate defines the "ports" (model provider, record store, image
//! extractor) that the infrastructure layer implements, plus everything that
//! runs on top of them: the credential pool, the tool set, conversation
//! memory, the agent loop and the turn coordinator. It depends only on
//! `applymate-types` -- never on `applymate-infra` or any network crate.

pub mod agent;
pub mod inbound;
pub mod llm;
pub mod memory;
pub mod records;
pub mod tools;
pub mod vision;
