//! Observability: structured logging and engine metrics.

pub mod logging;
pub mod metrics;
