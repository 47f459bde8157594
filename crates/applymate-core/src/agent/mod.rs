//! The conversational agent.
//!
//! - `prompt`: fixed system instructions
//! - `context`: working-transcript trimming
//! - `repeat_guard`: per-turn breaker for identical tool calls
//! - `engine`: `AgentLoop`, the model/tool state machine
//! - `coordinator`: `TurnCoordinator`, timeouts, per-user serialization and apologies

pub mod context;
pub mod coordinator;
pub mod engine;
pub mod prompt;
pub mod repeat_guard;
