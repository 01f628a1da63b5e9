//! Pipewatch CLI
//!
//! Command-line interface for the Pipewatch monitoring server.

mod commands;
mod config;
mod display;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "pipewatch")]
#[command(about = "Pipewatch ETL pipeline monitoring CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "PIPEWATCH_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Shared secret for mutating commands
    #[arg(long, env = "PIPEWATCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.url,
        api_key: cli.api_key,
    };

    handle_command(cli.command, &config).await
}
