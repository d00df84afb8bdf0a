//! Subscriber setup for the binary. Libraries only emit events.

use tracing_subscriber::EnvFilter;

use crate::error::{AppError, Result};

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "RICEBAR_LOG";
pub const DEFAULT_FILTER: &str = "info";

/// Filter from `RICEBAR_LOG`, or `info` when unset or unparsable.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber, as JSON lines when `json` is set.
pub fn init(json: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };
    installed.map_err(|err| AppError::Logging {
        message: err.to_string(),
    })
}
