//! Tracing setup for tests.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a test, reading `RUST_LOG` for the filter.
///
/// Safe to call from every test. Repeated initialization is ignored.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_test_writer()
        .try_init();
}
