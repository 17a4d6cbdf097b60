//! Tracing setup for the check-in binaries.
//!
//! All log output goes to stderr: `checkin` prints reports and meal ids on
//! stdout and scripts read them from there. `RUST_LOG`, when set, always
//! takes precedence over the level chosen here.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default level: only skipped records, retries and failures
pub const QUIET_LEVEL: &str = "warn";

/// `--verbose`: gate decisions and per-day intake as well
pub const VERBOSE_LEVEL: &str = "debug";

pub fn level_for(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LEVEL
    } else {
        QUIET_LEVEL
    }
}

/// Install the global subscriber. Later calls leave the first one in place.
pub fn init(verbose: bool) {
    init_with_level(level_for(verbose))
}

pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);

    if tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Subscriber already installed, keeping it");
    }
}

/// Route logs through the test harness so they show up only on failure
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new(VERBOSE_LEVEL))
        .try_init();
}
