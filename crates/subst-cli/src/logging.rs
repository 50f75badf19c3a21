//! Diagnostic logging to stderr

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEFAULT_LEVEL: &str = "warn";

/// Install the global subscriber
///
/// `RUST_LOG` wins when set, otherwise `level` (or `warn`) applies.
/// stdout is reserved for manifests, so everything goes to stderr.
pub fn init(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or(DEFAULT_LEVEL)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // A second init (tests) leaves the first subscriber in place
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
