//! Human-readable status lines for the console
//!
//! The top-level flow emits [`Event`]s through a [`Reporter`]; the CLI prints
//! them with colours, tests record them.

use colored::Colorize;
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Probing { port: u16 },
    PortOccupied { port: u16 },
    PortAvailable { port: u16 },
    ProbeFailed { port: u16, reason: String },
    Started { port: u16, addr: SocketAddr, url: String },
    BindFailed { port: u16, error: String },
    Stopped,
}

pub trait Reporter {
    fn report(&mut self, event: &Event);
}

/// Prints status lines to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn lines(event: &Event) -> Vec<String> {
        match event {
            Event::Probing { port } => vec![format!("Testing port {} availability...", port)],
            Event::PortOccupied { port } => vec![
                format!("{} Port {} is already in use", "✗".red(), port),
                "Something else is running on this port".to_string(),
            ],
            Event::PortAvailable { port } => vec![
                format!("{} Port {} is available", "✓".green(), port),
                "Starting static file server...".to_string(),
            ],
            Event::ProbeFailed { port, reason } => vec![
                format!("{} Could not probe port {}: {}", "!".yellow(), port, reason),
                "Trying to bind anyway...".to_string(),
            ],
            Event::Started { port, addr, url } => vec![
                format!("{} Static file server started on port {} ({})", "✓".green(), port, addr),
                format!("Test URL: {}", url.cyan()),
                "Press Ctrl+C to stop".to_string(),
            ],
            Event::BindFailed { port, error } => vec![format!(
                "{} Failed to start static file server on port {}: {}",
                "✗".red(),
                port,
                error
            )],
            Event::Stopped => vec!["Server stopped".to_string()],
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, event: &Event) {
        for line in Self::lines(event) {
            println!("{}", line);
        }
    }
}

/// Keeps every event, for tests and embedding
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<Event>,
}

impl Reporter for RecordingReporter {
    fn report(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}
