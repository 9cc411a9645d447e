//! # portserve core
//!
//! A local manual-testing aid: probe whether a TCP port on localhost already
//! has a listener, and if it does not, serve a directory over a minimal
//! static-file HTTP handler on that port.
//!
//! ## Flow
//!
//! ```text
//!   ServeConfig ──► PortProber ──► Occupied ──► exit 1
//!                        │
//!                        ├─► Free / ProbeFailed
//!                        ▼
//!               StaticFileServer::bind ──► Bind error ──► exit 2
//!                        │
//!                        ▼
//!               serve (one request at a time) ──► Ctrl-C ──► exit 0
//! ```

pub mod config;
pub mod errors;
pub mod logging;
pub mod port;
pub mod report;
pub mod runner;
pub mod server;
pub mod shutdown;

pub use config::ServeConfig;
pub use errors::{Result, ServeError};
pub use port::{PortProber, ProbeOutcome, ProbeReport};
pub use report::{ConsoleReporter, Event, RecordingReporter, Reporter};
pub use runner::{run, probe_only, RunOutcome};
pub use server::{ServerState, StaticFileServer, StaticHandler};

/// Crate version, also sent in the `Server` header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
