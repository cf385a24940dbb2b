//! Logging setup.
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them install a subscriber here once.

use tracing_subscriber::EnvFilter;

use crate::config::StoreConfig;

/// Installs a fmt subscriber. `RUST_LOG` wins over `level` when set.
///
/// Returns false if a global subscriber was already installed.
pub fn init(level: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

pub fn init_from_config(config: &StoreConfig) -> bool {
    init(&config.logging.level)
}
