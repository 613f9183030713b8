//! Logging setup.
//!
//! The library only emits `tracing` events. Binaries and test harnesses that
//! want them printed call [`init`] once.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Returns false if a global subscriber was already installed.
pub fn init() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
