//! Per-user conversation memory.

pub mod conversation;
