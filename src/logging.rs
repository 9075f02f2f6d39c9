//! Tracing setup for the binary.
//!
//! The filter is read from `STEPSNAP_LOG`, then `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "STEPSNAP_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Calling it again is harmless.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
