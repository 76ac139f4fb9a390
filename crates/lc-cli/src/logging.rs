use tracing_subscriber::EnvFilter;

pub(crate) const LOG_ENV: &str = "LUA_CALL_LOG";

/// Stderr subscriber filtered by `LUA_CALL_LOG`, `warn` when unset.
pub(crate) fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when running in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
