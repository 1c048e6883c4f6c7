//! Tracing subscriber setup for binaries and tests.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, honouring `RUST_LOG`. Safe to call
/// more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
