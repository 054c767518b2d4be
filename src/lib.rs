pub mod classify;
pub mod config;
pub mod db;
pub mod extract;
pub mod format;
pub mod model;
pub mod notify;
pub mod olx;
pub mod pipeline;
pub mod scheduler;

/// Install the compact `tracing` subscriber used by every binary.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
