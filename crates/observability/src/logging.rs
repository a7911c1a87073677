//! Subscriber setup for a `wrap()`ped server.

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber with an `EnvFilter` honoring
/// `RUST_LOG`, defaulting to `info` (or `debug` when `debug` is set).
///
/// Returns `Err` if a global subscriber is already installed; callers that
/// don't care (e.g. tests using `tracing-test`) can ignore the result.
pub fn init_subscriber(debug: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
}
