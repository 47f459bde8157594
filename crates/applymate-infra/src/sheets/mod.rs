//! Google Sheets record store.
//!
//! One spreadsheet tab holds one job per row under a fixed header row.
//! Authentication uses a service account; see [`auth`].

pub mod auth;
pub mod client;
pub mod rows;
