//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod alert;
mod metrics;
mod pipeline;
mod run;

pub use alert::AlertCommands;
pub use metrics::MetricsCommands;
pub use pipeline::PipelineCommands;
pub use run::RunCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipeline management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Run tracking
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Alert management
    Alert {
        #[command(subcommand)]
        command: AlertCommands,
    },
    /// Fleet-wide dashboard figures
    Stats,
    /// Latency and volume trends
    Metrics {
        #[command(subcommand)]
        command: MetricsCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, &client).await,
        Commands::Run { command } => run::handle_run_command(command, &client).await,
        Commands::Alert { command } => alert::handle_alert_command(command, &client).await,
        Commands::Stats => metrics::show_stats(&client).await,
        Commands::Metrics { command } => metrics::handle_metrics_command(command, &client).await,
    }
}
