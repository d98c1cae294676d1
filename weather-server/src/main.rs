//! Binary crate for the `weather-mcp` server.
//!
//! This crate focuses on:
//! - Serving MCP over stdio through rmcp
//! - Parsing CLI arguments, including one-shot `alerts` / `forecast` commands
//! - Interactive configuration

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod server;
mod stdio;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(&cmd.log_level);
    cmd.run().await
}

/// stdout belongs to the protocol, so logs always go to stderr.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}
