//! Tracing/logging setup shared by the console binary and client embedders.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, init, init_with};
