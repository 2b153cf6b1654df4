//! Structured logging setup.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. Thread names are included so
/// per-stage log lines are attributable; the level comes from `RUST_LOG`,
/// defaulting to `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();
}
