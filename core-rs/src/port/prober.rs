/**
 * prober.rs
 * TCP connect probe for a local port
 *
 * A successful connect means something is already listening. Refused or
 * timed-out connects mean the port is free. Anything else is reported as a
 * probe failure instead of being folded into "free".
 */

use serde::Serialize;
use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::ServeConfig;

/// Result of probing a port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A connection was accepted: something already listens on the port
    Occupied,
    /// Connection refused or timed out
    Free,
    /// The probe itself could not be carried out
    ProbeFailed(String),
}

impl ProbeOutcome {
    /// Stable lowercase label (used in JSON output)
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeOutcome::Occupied => "occupied",
            ProbeOutcome::Free => "free",
            ProbeOutcome::ProbeFailed(_) => "probe_failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ProbeOutcome::ProbeFailed(reason) => Some(reason.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::ProbeFailed(reason) => write!(f, "probe failed: {}", reason),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Machine-readable probe result
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProbeReport {
    pub host: String,
    pub port: u16,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Probes whether a TCP port already has a listener
#[derive(Debug, Clone)]
pub struct PortProber {
    host: String,
    port: u16,
    timeout: Duration,
}

impl PortProber {
    /// Create a new prober
    ///
    /// # Arguments
    /// * `host` - Host to connect to (e.g. "127.0.0.1")
    /// * `port` - Port to probe
    /// * `timeout` - Maximum time to wait for the connect
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn from_config(config: &ServeConfig) -> Self {
        Self::new(config.probe_host.clone(), config.port, config.probe_timeout())
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target address as a string (IPv6 literals are bracketed)
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Attempt one connect to the target within the timeout
    ///
    /// The probe socket is dropped before returning.
    pub async fn probe(&self) -> ProbeOutcome {
        let address = self.address();

        if self.port == 0 {
            warn!("Cannot probe {}: port 0 is not a connectable port", address);
            return ProbeOutcome::ProbeFailed("port 0 is not a connectable port".to_string());
        }

        debug!("Probing {} (timeout {:?})", address, self.timeout);

        match timeout(self.timeout, TcpStream::connect((self.host.as_str(), self.port))).await {
            Ok(Ok(_stream)) => {
                debug!("Connected to {}: port is occupied", address);
                ProbeOutcome::Occupied
            }
            Ok(Err(e)) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::TimedOut) => {
                debug!("Connect to {} failed ({}): port is free", address, e);
                ProbeOutcome::Free
            }
            Ok(Err(e)) => {
                warn!("Error probing {}: {}", address, e);
                ProbeOutcome::ProbeFailed(e.to_string())
            }
            Err(_elapsed) => {
                debug!("Connect to {} timed out after {:?}: port is free", address, self.timeout);
                ProbeOutcome::Free
            }
        }
    }

    /// Blocking variant of [`probe`](Self::probe) for callers outside a runtime
    ///
    /// Must not be called from within a tokio runtime.
    pub fn probe_blocking(&self) -> ProbeOutcome {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Could not start probe runtime: {}", e);
                return ProbeOutcome::ProbeFailed(e.to_string());
            }
        };

        runtime.block_on(self.probe())
    }

    /// Boolean view: true only when a listener answered
    pub async fn is_occupied(&self) -> bool {
        self.probe().await == ProbeOutcome::Occupied
    }

    /// Package an outcome of this prober for reporting
    pub fn to_report(&self, outcome: &ProbeOutcome) -> ProbeReport {
        ProbeReport {
            host: self.host.clone(),
            port: self.port,
            outcome: outcome.as_str(),
            reason: outcome.reason().map(str::to_string),
        }
    }
}
