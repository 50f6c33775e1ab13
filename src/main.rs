//! Indigo MCP Server - Main Entry Point
//!
//! Serves the Indigo tools over stdio, or runs a one-off connectivity check
//! against the host.

use clap::{Parser, Subcommand};
use indigo_mcp_rust::{
    logging::init_logging,
    server::{serve_stdio, BridgeContext, IndigoBackend},
    Result, ServerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Indigo MCP Server Configuration
#[derive(Parser, Debug)]
#[command(name = "indigo-mcp-server")]
#[command(about = "MCP server for the Indigo home automation host")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "INDIGO_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Path to the indigo-host executable
    #[arg(long, global = true)]
    host_executable: Option<String>,

    /// Seconds to wait for the host before giving up
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Directory holding Indigo event logs
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP over stdio (default)
    Stdio,
    /// List folders once to verify the host can be reached
    Check,
}

impl Cli {
    /// Load configuration and apply command line overrides
    fn load_config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;

        if let Some(executable) = &self.host_executable {
            config.host.executable = executable.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.host.timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = &self.log_dir {
            config.logs.directory = dir.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config.logging, cli.debug)?;

    info!("Starting Indigo MCP Server v{}", env!("CARGO_PKG_VERSION"));

    let context = Arc::new(BridgeContext::initialize(config)?);

    match cli.command.unwrap_or(Command::Stdio) {
        Command::Stdio => {
            serve_stdio(IndigoBackend::new(context)).await?;
        }
        Command::Check => {
            let result = context.check_host().await;
            context.shutdown();

            match result {
                Ok(folders) => {
                    info!("Indigo host reachable");
                    println!("{folders}");
                }
                Err(e) => {
                    error!("Indigo host check failed: {e}");
                    return Err(e);
                }
            }
        }
    }

    info!("Indigo MCP Server stopped");
    Ok(())
}
