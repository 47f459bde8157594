//! HTTP request handlers for the REST API.

pub mod chat;
pub mod credentials;
pub mod inbound;
pub mod memory;
pub mod send;
