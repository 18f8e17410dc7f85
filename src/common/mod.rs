//! Common types and utilities shared across the crate

pub mod errors;
pub mod shutdown;
pub mod traits;
pub mod types;
