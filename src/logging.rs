//! Tracing subscriber setup shared by the binaries

use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr subscriber filtered at `level`; `RUST_LOG` takes precedence.
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
