//! Pipeline command handlers
//!
//! Listing with health rollups, details, registration, patching and retries.

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use colored::*;
use pipewatch_client::PipewatchClient;
use pipewatch_core::domain::pipeline::PipelineStatus;
use pipewatch_core::dto::FieldPatch;
use pipewatch_core::dto::pipeline::{CreatePipeline, PipelineDetail, PipelineSummary, UpdatePipeline};

use crate::commands::run::wait_for_run;
use crate::display;
use crate::id_resolver::{IdOrPrefix, resolve_pipeline_id};

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// List pipelines with their success rate and last run
    List {
        /// Only pipelines in this status
        #[arg(short, long)]
        status: Option<PipelineStatus>,
    },
    /// Show a pipeline with its recent runs and alerts
    Get {
        /// Pipeline ID or unambiguous prefix
        id: IdOrPrefix,

        /// Number of recent runs to show
        #[arg(short = 'n', long, default_value = "10")]
        runs: usize,
    },
    /// Register a new pipeline
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Initial status (default: active)
        #[arg(long)]
        status: Option<PipelineStatus>,

        /// Schedule expression, e.g. "0 2 * * *"
        #[arg(long)]
        schedule: Option<String>,

        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        destination: Option<String>,

        /// What the pipeline counts, e.g. "rows" or "orders"
        #[arg(long)]
        item_unit: Option<String>,
    },
    /// Change some fields of a pipeline
    Update {
        /// Pipeline ID or unambiguous prefix
        id: IdOrPrefix,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<PipelineStatus>,

        #[arg(long)]
        schedule: Option<String>,

        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        destination: Option<String>,

        #[arg(long)]
        item_unit: Option<String>,

        /// Fields to clear (repeatable)
        #[arg(long, value_enum)]
        clear: Vec<ClearableField>,
    },
    /// Start a new run of a pipeline now
    Retry {
        /// Pipeline ID or unambiguous prefix
        id: IdOrPrefix,

        /// Wait for the run to finish
        #[arg(short, long)]
        wait: bool,
    },
}

/// Optional pipeline fields that can be cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClearableField {
    Description,
    Schedule,
    Source,
    Destination,
    ItemUnit,
}

/// Handle pipeline commands
pub async fn handle_pipeline_command(
    command: PipelineCommands,
    client: &PipewatchClient,
) -> Result<()> {
    match command {
        PipelineCommands::List { status } => list_pipelines(client, status).await,
        PipelineCommands::Get { id, runs } => get_pipeline(client, &id, runs).await,
        PipelineCommands::Create {
            name,
            description,
            status,
            schedule,
            source,
            destination,
            item_unit,
        } => {
            let req = CreatePipeline {
                name,
                description,
                status,
                schedule,
                source,
                destination,
                item_unit,
            };
            create_pipeline(client, req).await
        }
        PipelineCommands::Update {
            id,
            name,
            description,
            status,
            schedule,
            source,
            destination,
            item_unit,
            clear,
        } => {
            let patch = UpdatePipeline {
                name: name.into(),
                status: status.into(),
                description: field_patch(description, &clear, ClearableField::Description),
                schedule: field_patch(schedule, &clear, ClearableField::Schedule),
                source: field_patch(source, &clear, ClearableField::Source),
                destination: field_patch(destination, &clear, ClearableField::Destination),
                item_unit: field_patch(item_unit, &clear, ClearableField::ItemUnit),
            };
            update_pipeline(client, &id, patch).await
        }
        PipelineCommands::Retry { id, wait } => retry_pipeline(client, &id, wait).await,
    }
}

/// A value wins over a clear; neither leaves the field unchanged
fn field_patch(
    value: Option<String>,
    clear: &[ClearableField],
    field: ClearableField,
) -> FieldPatch<String> {
    match value {
        Some(value) => FieldPatch::Set(value),
        None if clear.contains(&field) => FieldPatch::Clear,
        None => FieldPatch::Unchanged,
    }
}

/// List pipelines with their health rollup
async fn list_pipelines(client: &PipewatchClient, status: Option<PipelineStatus>) -> Result<()> {
    let pipelines = client.list_pipelines(status).await?;

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} pipeline(s):", pipelines.len()).bold()
    );
    println!();
    for summary in &pipelines {
        print_pipeline_summary(summary);
    }

    Ok(())
}

async fn get_pipeline(client: &PipewatchClient, id: &IdOrPrefix, runs: usize) -> Result<()> {
    let uuid = resolve_pipeline_id(client, id).await?;

    let detail = client.get_pipeline(uuid).await?;

    print_pipeline_details(&detail, runs);

    Ok(())
}

async fn create_pipeline(client: &PipewatchClient, req: CreatePipeline) -> Result<()> {
    let created = client.create_pipeline(req).await?;

    println!("{}", "✓ Pipeline created successfully!".green().bold());
    println!("  ID:   {}", created.id.to_string().cyan());
    println!("  Name: {}", created.name.bold());

    Ok(())
}

async fn update_pipeline(
    client: &PipewatchClient,
    id: &IdOrPrefix,
    patch: UpdatePipeline,
) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("Nothing to update; pass at least one field or --clear");
    }

    let uuid = resolve_pipeline_id(client, id).await?;
    let updated = client.update_pipeline(uuid, &patch).await?;

    println!("{}", "✓ Pipeline updated successfully!".green().bold());
    println!("  ID:     {}", updated.id.to_string().cyan());
    println!("  Name:   {}", updated.name.bold());
    println!("  Status: {}", display::pipeline_status(updated.status));

    Ok(())
}

async fn retry_pipeline(client: &PipewatchClient, id: &IdOrPrefix, wait: bool) -> Result<()> {
    let uuid = resolve_pipeline_id(client, id).await?;

    let started = client.retry_pipeline(uuid).await?;

    println!("{}", "✓ Run started".green().bold());
    println!("  Run ID: {}", started.run_id.to_string().cyan());

    if wait {
        wait_for_run(client, started.run_id).await?;
    }

    Ok(())
}

/// Print a pipeline summary
fn print_pipeline_summary(summary: &PipelineSummary) {
    let pipeline = &summary.pipeline;
    let rollup = &summary.rollup;

    println!(
        "  {} {} [{}]",
        "▸".cyan(),
        pipeline.name.bold(),
        display::pipeline_status(pipeline.status)
    );
    println!("    ID:           {}", pipeline.id.to_string().dimmed());
    println!(
        "    Success rate: {}",
        display::success_rate(rollup.success_rate)
    );
    println!(
        "    Avg duration: {}",
        display::duration(rollup.avg_duration_ms)
    );
    match &rollup.last_run {
        Some(run) => println!(
            "    Last run:     {} at {}",
            display::run_status(run.status),
            display::timestamp(run.started_at).dimmed()
        ),
        None => println!("    Last run:     {}", "never".dimmed()),
    }
    println!();
}

/// Print detailed pipeline information
fn print_pipeline_details(detail: &PipelineDetail, max_runs: usize) {
    let pipeline = &detail.pipeline;

    println!("{}", "Pipeline Details:".bold());
    println!("  ID:          {}", pipeline.id.to_string().cyan());
    println!("  Name:        {}", pipeline.name.bold());
    println!("  Status:      {}", display::pipeline_status(pipeline.status));
    if let Some(desc) = &pipeline.description {
        println!("  Description: {}", desc);
    }
    if let Some(schedule) = &pipeline.schedule {
        println!("  Schedule:    {}", schedule);
    }
    if pipeline.source.is_some() || pipeline.destination.is_some() {
        println!(
            "  Flow:        {} → {}",
            pipeline.source.as_deref().unwrap_or("?"),
            pipeline.destination.as_deref().unwrap_or("?")
        );
    }
    println!("  Created:     {}", display::timestamp(pipeline.created_at));
    println!("  Updated:     {}", display::timestamp(pipeline.updated_at));

    println!("\n{}", "Health (recent runs):".bold());
    println!(
        "  Success rate: {}",
        display::success_rate(detail.rollup.success_rate)
    );
    println!(
        "  Avg duration: {}",
        display::duration(detail.rollup.avg_duration_ms)
    );

    println!("\n{}", "Recent runs:".bold());
    if detail.recent_runs.is_empty() {
        println!("  {}", "No runs yet.".dimmed());
    }
    let unit = pipeline.item_unit.as_deref().unwrap_or("items");
    for run in detail.recent_runs.iter().take(max_runs) {
        let items = run
            .items_processed
            .map(|n| format!("{n} {unit}"))
            .unwrap_or_default();
        println!(
            "  {}  {:<8}  {:>9}  {}",
            display::timestamp(run.started_at).dimmed(),
            display::run_status(run.status),
            display::duration(run.duration_ms),
            items
        );
        if let Some(err) = &run.error_message {
            println!("    {}", err.red());
        }
    }

    if !detail.alerts.is_empty() {
        println!("\n{}", "Alerts:".bold());
        for alert in &detail.alerts {
            println!(
                "  [{}] {} ({})",
                display::alert_severity(alert.severity),
                alert.message,
                display::alert_status(alert.status)
            );
        }
    }
}
