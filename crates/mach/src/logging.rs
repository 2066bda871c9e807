//! Test logging.
//!
//! The engine reports phase switches and dispatch outcomes through `tracing`.
//! Tests that want to see them call [`init_test_logging`] first.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `MACH_LOG=mach=debug`
pub const LOG_ENV: &str = "MACH_LOG";

/// Filter used when [`LOG_ENV`] is not set
pub const DEFAULT_FILTER: &str = "warn";

/// Install a `tracing` subscriber that writes through the test harness
///
/// Safe to call from every test; only the first call installs a subscriber.
/// Returns whether this call installed it.
pub fn init_test_logging() -> bool {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(true)
        .try_init()
        .is_ok()
}
