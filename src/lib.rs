pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod pricing;
pub mod providers;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Call once, early.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
