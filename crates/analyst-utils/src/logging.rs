//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set.
///
/// Keeps the orchestration crates at info while silencing chatty
/// third-party targets.
const DEFAULT_FILTER: &str =
    "info,analyst_engine=info,analyst_scheduler=info,analyst_desk=info";

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

/// Initialize tracing subscriber with an explicit fallback filter
///
/// `RUST_LOG` still wins when set; `fallback` is used otherwise.
pub fn init_tracing_with(fallback: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
