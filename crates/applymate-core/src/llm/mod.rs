//! Model provider abstractions for ApplyMate.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `CredentialPool`: one provider per API credential, with usage windows
//!   and rate-limit rotation

pub mod box_provider;
pub mod credential_pool;
pub mod provider;

#[cfg(test)]
pub(crate) mod testing;
