//! Log output for applications embedding snapplot.
//!
//! The library only emits `tracing` events; nothing is printed unless the host
//! installs a subscriber. [`init`] is a convenience for hosts that have no
//! subscriber of their own.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `snapplot=debug`.
pub const LOG_ENV: &str = "SNAPPLOT_LOG";

/// Installs a stderr `fmt` subscriber filtered by [`LOG_ENV`].
///
/// Falls back to `snapplot=info` (`snapplot=debug` when `verbose`) when the
/// variable is unset or unparsable. Does nothing if a global subscriber is
/// already installed.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("snapplot={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
