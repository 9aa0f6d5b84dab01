//! Log subscriber setup for hosts and the replay CLI.
//!
//! The library only emits `tracing` events; it never installs a subscriber on its own.

use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;

pub const DEFAULT_FILTER: &str = "warn";

/// Installs a stderr `fmt` subscriber.
///
/// `filter` wins over `RUST_LOG`; both fall back to [`DEFAULT_FILTER`]. Returns `false`
/// when a global subscriber was already installed.
pub fn init_logging(filter: Option<&str>) -> bool {
    let filter = filter
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

pub fn init_from_config(config: &EngineConfig) -> bool {
    init_logging(config.log_filter.as_deref())
}
