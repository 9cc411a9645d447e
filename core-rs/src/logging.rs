//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence; otherwise the crate logs at `info`
//! (`debug` when verbose) and everything else at `warn`.

use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use crate::errors::{Result, ServeError};

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,portserve=debug,portserve_core=debug"
    } else {
        "warn,portserve=info,portserve_core=info"
    }
}

/// Initialize the global tracing subscriber (stderr, env filter)
///
/// Fails if a global subscriber is already installed.
pub fn init(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| ServeError::Logging(e.to_string()))?;

    debug!(verbose, "Tracing initialized");
    Ok(())
}
