//! jproxy command-line tool
//!
//! Inspects signatures and proxy manifests without a foreign runtime.

pub mod commands;
pub mod output;

/// Install the tracing subscriber.
///
/// The filter is read from `JPROXY_LOG` and defaults to `warn`. Logs go to
/// stderr so command output stays parseable.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("JPROXY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .ok();
}
