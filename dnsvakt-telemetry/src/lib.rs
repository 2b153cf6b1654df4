//! # dnsvakt-telemetry
//!
//! Observability for the pipeline: structured logging through `tracing` and
//! a prometheus registry of stage counters.

pub mod logging;
pub mod metrics;

pub use metrics::PipelineMetrics;
