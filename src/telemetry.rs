//! Logging setup for test runs.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "test_data_cache=info";

/// Installs the global tracing subscriber.
///
/// Defaults to `test_data_cache=info`, overridable with `RUST_LOG`. Calling it
/// again (for example from several test binaries or harness hooks) is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
