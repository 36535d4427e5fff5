//! Logging setup for programs built on commandr
//!
//! Logs go to stderr so they never mix with a command's own output.
//! The filter comes from `COMMANDR_LOG` (an `EnvFilter` directive such as
//! `debug` or `commandr=trace`), falling back to `warn`.

use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "COMMANDR_LOG";

const DEFAULT_LEVEL: &str = "warn";

/// Build the filter from `COMMANDR_LOG`, or `default` when unset or invalid
pub fn filter(default: &str) -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// Install the stderr subscriber; later calls are no-ops
pub fn init() {
    init_with_default(DEFAULT_LEVEL);
}

/// Install the stderr subscriber with a custom fallback level
pub fn init_with_default(default: &str) {
    let result = registry()
        .with(filter(default))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();

    if result.is_err() {
        tracing::trace!("Logging already initialized");
    }
}
