//! portserve - probe a local port, then serve a directory on it
//!
//! Command-line interface for the library

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use portserve_core::runner::{self, EXIT_FAILURE};
use portserve_core::{logging, shutdown, ConsoleReporter, PortProber, ServeConfig};

#[derive(Parser)]
#[command(name = "portserve")]
#[command(version)]
#[command(about = "Check a local port and serve the current directory on it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// YAML configuration file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Port to probe and serve (default 8080)
    #[arg(long, short = 'p', global = true)]
    port: Option<u16>,

    /// Directory to serve (default: current directory)
    #[arg(long, short = 'd', global = true)]
    root: Option<PathBuf>,

    /// Address to listen on (default 0.0.0.0)
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Host the probe connects to (default 127.0.0.1)
    #[arg(long, global = true)]
    probe_host: Option<String>,

    /// Probe connect timeout in seconds (default 5)
    #[arg(long, global = true)]
    probe_timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the port, then serve if it is free (default)
    Serve,
    /// Only probe the port (exit 0 free, 1 occupied, 2 probe failed)
    Probe {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Defaults < config file < flags
    fn resolve_config(&self) -> portserve_core::Result<ServeConfig> {
        let mut config = match &self.config {
            Some(path) => ServeConfig::load(path)?,
            None => ServeConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(host) = &self.probe_host {
            config.probe_host = host.clone();
        }
        if let Some(secs) = self.probe_timeout {
            config.probe_timeout_secs = secs;
        }

        Ok(config)
    }
}

async fn handle_serve(config: ServeConfig) -> anyhow::Result<i32> {
    let shutdown_rx = shutdown::install_ctrlc()?;
    let mut reporter = ConsoleReporter;

    match runner::run(&config, shutdown_rx, &mut reporter).await {
        Ok(outcome) => Ok(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(runner::error_exit_code(&e))
        }
    }
}

async fn handle_probe(config: ServeConfig, format: OutputFormat) -> anyhow::Result<i32> {
    if let Err(e) = config.validate_probe() {
        eprintln!("Error: {}", e);
        return Ok(runner::error_exit_code(&e));
    }

    let outcome = match format {
        OutputFormat::Text => {
            let mut reporter = ConsoleReporter;
            runner::probe_only(&config, &mut reporter).await
        }
        OutputFormat::Json => {
            let prober = PortProber::from_config(&config);
            let outcome = prober.probe().await;
            println!("{}", serde_json::to_string(&prober.to_report(&outcome))?);
            outcome
        }
    };

    Ok(runner::probe_exit_code(&outcome))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_FAILURE as u8);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => handle_serve(config).await,
        Commands::Probe { format } => handle_probe(config, format).await,
    };

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE as u8)
        }
    }
}
