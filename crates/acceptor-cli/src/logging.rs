//! Tracing subscriber setup.
//!
//! Logs go to stderr so `--format json` output on stdout stays parseable.
//! `RUST_LOG` overrides the level picked from `-v`/`-q`.

use tracing_subscriber::EnvFilter;

use crate::config::Verbosity;

/// Build the filter for a verbosity level
#[must_use]
pub fn filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_target(verbosity.is_debug())
        .with_writer(std::io::stderr)
        .try_init();
}
