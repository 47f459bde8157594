//! The six job-tracking tools the model can call.
//!
//! - `registry`: the static tool table and typed [`registry::ToolInvocation`]
//! - `set`: [`set::ToolSet`], which executes invocations against a record store
//! - `format`: text rendering shared by the tool results

pub mod format;
pub mod registry;
pub mod set;
