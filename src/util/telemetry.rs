//! Telemetry helpers for structured logging.

/// Install a default env-filtered `fmt` subscriber unless one is already set.
///
/// Filtering follows `RUST_LOG`; for example `RUST_LOG=contention=debug`
/// shows every reallocation.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Like [`init_tracing`] but with a fallback directive used when `RUST_LOG`
/// is unset.
pub fn init_tracing_with_default(directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
