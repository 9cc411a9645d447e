//! Interrupt handling
//!
//! Ctrl-C / SIGTERM flips a `watch` channel that the serving loop selects on.

use tokio::sync::watch;
use tracing::warn;

use crate::errors::Result;

/// Create a shutdown channel that starts in the "keep running" state
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Install the process-wide Ctrl-C / SIGTERM handler
///
/// Can only be installed once per process.
pub fn install_ctrlc() -> Result<watch::Receiver<bool>> {
    let (tx, rx) = channel();

    ctrlc::set_handler(move || {
        warn!("Received SIGTERM/SIGINT, shutting down gracefully...");
        let _ = tx.send(true);
    })?;

    Ok(rx)
}
