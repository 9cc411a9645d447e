//! Top-level flow: probe once, then serve only if the port is free
//!
//! Exit codes:
//! - 0: server stopped after an interrupt (or `probe` found the port free)
//! - 1: port already occupied, nothing was bound
//! - 2: probe failed (`probe` only), bind failure, fatal server or config error

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::ServeConfig;
use crate::errors::{Result, ServeError};
use crate::port::{PortProber, ProbeOutcome};
use crate::report::{Event, Reporter};
use crate::server::StaticFileServer;

pub const EXIT_OK: i32 = 0;
pub const EXIT_PORT_OCCUPIED: i32 = 1;
pub const EXIT_FAILURE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Something already listens on the port; the server was never bound
    PortOccupied,
    /// The server ran and was shut down
    Stopped,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::PortOccupied => EXIT_PORT_OCCUPIED,
            RunOutcome::Stopped => EXIT_OK,
        }
    }
}

/// Exit code for a flow that ended in an error
pub fn error_exit_code(_err: &ServeError) -> i32 {
    EXIT_FAILURE
}

/// Exit code for the probe-only command
pub fn probe_exit_code(outcome: &ProbeOutcome) -> i32 {
    match outcome {
        ProbeOutcome::Free => EXIT_OK,
        ProbeOutcome::Occupied => EXIT_PORT_OCCUPIED,
        ProbeOutcome::ProbeFailed(_) => EXIT_FAILURE,
    }
}

/// Probe the configured port and report the outcome
pub async fn probe_only<R>(config: &ServeConfig, reporter: &mut R) -> ProbeOutcome
where
    R: Reporter + ?Sized,
{
    let port = config.port;
    reporter.report(&Event::Probing { port });

    let outcome = PortProber::from_config(config).probe().await;
    match &outcome {
        ProbeOutcome::Occupied => reporter.report(&Event::PortOccupied { port }),
        ProbeOutcome::Free => reporter.report(&Event::PortAvailable { port }),
        ProbeOutcome::ProbeFailed(reason) => reporter.report(&Event::ProbeFailed {
            port,
            reason: reason.clone(),
        }),
    }
    outcome
}

/// Probe, then bind and serve until `shutdown` fires
///
/// A failed probe is not treated as "free" or "occupied": the flow goes on to
/// bind, which settles the question. A failed bind is fatal.
pub async fn run<R>(
    config: &ServeConfig,
    shutdown: watch::Receiver<bool>,
    reporter: &mut R,
) -> Result<RunOutcome>
where
    R: Reporter + ?Sized,
{
    config.validate()?;
    let port = config.port;

    match probe_only(config, reporter).await {
        ProbeOutcome::Occupied => {
            info!("Port {} is occupied, not starting server", port);
            return Ok(RunOutcome::PortOccupied);
        }
        ProbeOutcome::Free => {}
        ProbeOutcome::ProbeFailed(reason) => {
            warn!("Probe of port {} failed ({}), attempting bind", port, reason);
        }
    }

    let mut server = StaticFileServer::new(config.clone());
    let addr = match server.bind().await {
        Ok(addr) => addr,
        Err(e) => {
            reporter.report(&Event::BindFailed {
                port,
                error: e.to_string(),
            });
            return Err(e);
        }
    };

    reporter.report(&Event::Started {
        port: addr.port(),
        addr,
        url: server.base_url().unwrap_or_else(|| format!("http://localhost:{}", addr.port())),
    });

    server.serve(shutdown).await?;
    reporter.report(&Event::Stopped);

    Ok(RunOutcome::Stopped)
}
