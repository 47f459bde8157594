//! Secrets resolution.
//!
//! Secrets are read from the environment only and are wrapped in
//! [`secrecy::SecretString`] as soon as they are read.

pub mod env;

pub use env::{EnvSecrets, ServiceAccountSecrets};
