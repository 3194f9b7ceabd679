//! Tracing subscriber setup for tests and host binaries
//!
//! The core only emits `tracing` events; hosts embedding the crate install
//! whatever subscriber stack they run in production. This helper covers the
//! simple cases: tests and standalone tools.

use tracing_subscriber::EnvFilter;

/// Initialize a fmt subscriber filtered by `RUST_LOG` (default `info`)
///
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
