// Static File Server
//
// Binds one listener and handles connections strictly one at a time:
// accept, read the request, write the response, close, then accept again.
//
// States: NotStarted -> Serving (bind succeeded) -> Stopped (shutdown
// signal or fatal accept error). A failed bind leaves the server NotStarted.

pub mod handler;
pub mod http;
pub mod listing;

pub use handler::StaticHandler;
pub use http::{Method, Request, Response, Status};

use std::fmt;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::ServeConfig;
use crate::errors::{Result, ServeError};

const DRAIN_TIMEOUT: Duration = Duration::from_millis(200);
const MAX_DRAIN_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    NotStarted,
    Serving,
    Stopped,
}

impl ServerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerState::NotStarted => "NotStarted",
            ServerState::Serving => "Serving",
            ServerState::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct StaticFileServer {
    config: ServeConfig,
    handler: StaticHandler,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    state: ServerState,
}

impl StaticFileServer {
    pub fn new(config: ServeConfig) -> Self {
        let handler = StaticHandler::new(config.root.clone());
        Self {
            config,
            handler,
            listener: None,
            local_addr: None,
            state: ServerState::NotStarted,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Address actually bound (resolves port 0 to the assigned port)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// URL a local browser can use to reach the server
    pub fn base_url(&self) -> Option<String> {
        self.local_addr
            .map(|addr| format!("http://localhost:{}", addr.port()))
    }

    /// Bind the listening socket and enter `Serving`
    ///
    /// # Errors
    /// - `InvalidState` if the server was already bound
    /// - `Bind` if the address is taken or not permitted
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        if self.state != ServerState::NotStarted {
            return Err(ServeError::InvalidState {
                expected: ServerState::NotStarted.as_str(),
                found: self.state.as_str(),
            });
        }

        let addr = self.config.bind_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            error!("Failed to bind {}: {}", addr, source);
            ServeError::Bind { addr, source }
        })?;
        let local_addr = listener.local_addr()?;

        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        self.state = ServerState::Serving;

        info!(
            "Serving {} on {}",
            self.handler.root().display(),
            local_addr
        );
        Ok(local_addr)
    }

    /// Accept and handle connections until `shutdown` turns true
    ///
    /// A closed shutdown channel is treated as a shutdown request. The
    /// listening socket is closed before returning.
    pub async fn serve(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let listener = match (self.state, self.listener.take()) {
            (ServerState::Serving, Some(listener)) => listener,
            _ => {
                return Err(ServeError::InvalidState {
                    expected: ServerState::Serving.as_str(),
                    found: self.state.as_str(),
                })
            }
        };

        let result = self.accept_loop(&listener, &mut shutdown).await;

        drop(listener);
        self.state = ServerState::Stopped;
        info!("Server stopped");
        result
    }

    async fn accept_loop(
        &self,
        listener: &TcpListener,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested, no longer accepting connections");
                return Ok(());
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown channel closed");
                        return Ok(());
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.handle_connection(stream, peer).await,
                    Err(e) if is_transient_accept_error(&e) => {
                        warn!("Transient accept error: {}", e);
                    }
                    Err(e) => {
                        error!("Fatal accept error: {}", e);
                        return Err(e.into());
                    }
                },
            }
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        debug!("Connection from {}", peer);
        let request_timeout = self.config.request_timeout();
        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half);

        let (response, head_only, request_line) =
            match timeout(request_timeout, http::read_request(&mut reader)).await {
                Err(_elapsed) => {
                    warn!("Request from {} timed out after {:?}", peer, request_timeout);
                    return;
                }
                Ok(Ok(None)) => {
                    debug!("{} closed the connection without a request", peer);
                    return;
                }
                Ok(Ok(Some(request))) => {
                    let response = self.handler.handle(&request).await;
                    (response, request.method == Method::Head, request.request_line())
                }
                Ok(Err(e)) => {
                    let response = Response::error(e.status(), &e.to_string());
                    (response, false, "-".to_string())
                }
            };

        info!(
            target: "portserve::access",
            peer = %peer,
            status = response.status.code(),
            "\"{}\" {}",
            request_line,
            response.status.code()
        );

        // A client that stops reading must not hold the only slot either
        let write = async {
            response.write_to(&mut write_half, head_only).await?;
            write_half.shutdown().await
        };
        match timeout(request_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Error writing response to {}: {}", peer, e),
            Err(_elapsed) => {
                warn!("Response to {} timed out after {:?}", peer, request_timeout);
                return;
            }
        }

        // Unread request bytes would turn the close into a reset
        let mut leftover = (&mut reader).take(MAX_DRAIN_BYTES);
        let _ = timeout(DRAIN_TIMEOUT, tokio::io::copy(&mut leftover, &mut tokio::io::sink())).await;
    }
}

fn is_transient_accept_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted | ErrorKind::WouldBlock
    )
}
