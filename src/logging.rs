use crate::error::{RegistryError, Result};
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for a build.
///
/// Logs go to stderr so stdout stays free for the build summary. `RUST_LOG`
/// takes precedence; otherwise `verbose` selects `debug` over `info`.
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| RegistryError::config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| RegistryError::config(format!("Logging already initialized: {}", e)))?;

    Ok(())
}
