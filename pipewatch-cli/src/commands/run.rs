//! Run command handlers

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use pipewatch_client::PipewatchClient;
use pipewatch_core::dto::run::RunStatusView;
use uuid::Uuid;

use crate::display;
use crate::id_resolver::{IdOrPrefix, resolve_pipeline_id};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Open a running run to be completed later through the webhook
    Start {
        /// Pipeline ID or unambiguous prefix
        pipeline: IdOrPrefix,
    },
    /// Show the status of a run
    Get {
        /// Run ID
        id: Uuid,

        /// Poll until the run finishes
        #[arg(short, long)]
        wait: bool,
    },
}

pub async fn handle_run_command(command: RunCommands, client: &PipewatchClient) -> Result<()> {
    match command {
        RunCommands::Start { pipeline } => {
            let pipeline_id = resolve_pipeline_id(client, &pipeline).await?;
            let started = client.start_run(pipeline_id).await?;

            println!("{}", "✓ Run started".green().bold());
            println!("  Run ID: {}", started.run_id.to_string().cyan());
            Ok(())
        }
        RunCommands::Get { id, wait: false } => {
            let run = client.get_run(id).await?;
            print_run(&run);
            Ok(())
        }
        RunCommands::Get { id, wait: true } => wait_for_run(client, id).await,
    }
}

/// Poll a run until it leaves `running`, then print it
pub async fn wait_for_run(client: &PipewatchClient, run_id: Uuid) -> Result<()> {
    println!("{}", "Waiting for run to finish...".dimmed());

    loop {
        let run = client.get_run(run_id).await?;
        if run.status.is_terminal() {
            print_run(&run);
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn print_run(run: &RunStatusView) {
    println!("{}", "Run:".bold());
    println!("  ID:        {}", run.id.to_string().cyan());
    println!("  Status:    {}", display::run_status(run.status));
    println!("  Duration:  {}", display::duration(run.duration_ms));
    if let Some(items) = run.rows_processed {
        println!("  Processed: {}", items);
    }
    if let Some(finished) = run.finished_at {
        println!("  Finished:  {}", display::timestamp(finished));
    }
    if let Some(err) = &run.error_message {
        println!("  Error:     {}", err.red());
    }
}
