//! Error types for portserve

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    #[error("Invalid server state: expected {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Signal handler error: {0}")]
    Signal(String),

    #[error("Logging initialization error: {0}")]
    Logging(String),
}

impl From<ctrlc::Error> for ServeError {
    fn from(err: ctrlc::Error) -> Self {
        ServeError::Signal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServeError>;
