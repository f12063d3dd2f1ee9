//! Observability module.
//!
//! Structured logging via `tracing`, with pretty, compact, and JSON output
//! formats selected from `[observability.logging]`.

mod tracing_init;

pub use tracing_init::*;
