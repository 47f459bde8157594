//! Record store port and the in-process implementation.

pub mod memory;
pub mod store;
