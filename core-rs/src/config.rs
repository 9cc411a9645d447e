/**
 * config.rs
 * Runtime configuration for the prober and the static file server
 *
 * Format (all fields optional):
 * ```yaml
 * port: 8080
 * probeHost: 127.0.0.1
 * bindAddress: 0.0.0.0
 * probeTimeoutSecs: 5
 * requestTimeoutSecs: 30
 * root: .
 * ```
 *
 * Precedence: defaults < YAML file < command-line flags
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{Result, ServeError};

/// Default port probed and served
pub const DEFAULT_PORT: u16 = 8080;

/// Default host the prober connects to
pub const DEFAULT_PROBE_HOST: &str = "127.0.0.1";

/// Default listen address (all interfaces)
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default probe connect timeout, in seconds
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Default per-connection request read timeout, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration shared by the prober and the static file server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ServeConfig {
    pub port: u16,
    pub probe_host: String,
    pub bind_address: String,
    pub probe_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub root: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            probe_host: DEFAULT_PROBE_HOST.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            root: PathBuf::from("."),
        }
    }
}

impl ServeConfig {
    /// Load configuration from a YAML file
    ///
    /// Fields missing from the file keep their defaults.
    ///
    /// # Arguments
    /// * `path` - Path to the YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ServeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: ServeConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check that the configuration can actually be used
    ///
    /// # Errors
    /// Returns error if:
    /// - any check in [`ServeConfig::validate_probe`] fails
    /// - request timeout is 0
    /// - bind address is not an IP address
    /// - root does not exist or is not a directory
    pub fn validate(&self) -> Result<()> {
        self.validate_probe()?;

        if self.request_timeout_secs == 0 {
            return Err(ServeError::Config("requestTimeoutSecs must be greater than 0".to_string()));
        }

        self.bind_addr()?;

        if !self.root.is_dir() {
            return Err(ServeError::RootNotFound(self.root.clone()));
        }

        Ok(())
    }

    /// Check only the fields the prober uses
    ///
    /// The `probe` subcommand never binds or serves, so the root and bind
    /// address are not its concern.
    pub fn validate_probe(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ServeError::InvalidPort(self.port));
        }

        if self.probe_timeout_secs == 0 {
            return Err(ServeError::Config("probeTimeoutSecs must be greater than 0".to_string()));
        }

        if self.probe_host.trim().is_empty() {
            return Err(ServeError::Config("probeHost must not be empty".to_string()));
        }

        Ok(())
    }

    /// Socket address the server listens on
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ServeError::Config(format!("Invalid bindAddress: {}", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
