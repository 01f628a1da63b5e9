//! Alert command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use pipewatch_client::PipewatchClient;
use pipewatch_core::domain::alert::{Alert, AlertSeverity, AlertStatus};
use pipewatch_core::dto::alert::{AlertQuery, CreateAlert};

use crate::display;
use crate::id_resolver::{IdOrPrefix, resolve_alert_id, resolve_pipeline_id};

/// Alert subcommands
#[derive(Subcommand)]
pub enum AlertCommands {
    /// List alerts, newest first
    List {
        /// Only alerts in this status
        #[arg(short, long)]
        status: Option<AlertStatus>,

        /// Only alerts for this pipeline (ID or prefix)
        #[arg(short, long)]
        pipeline: Option<IdOrPrefix>,
    },
    /// Raise a new alert
    Create {
        /// critical, warning or info
        #[arg(short, long)]
        severity: AlertSeverity,

        #[arg(short, long)]
        message: String,

        /// Pipeline the alert concerns (ID or prefix); omit for a global alert
        #[arg(short, long)]
        pipeline: Option<IdOrPrefix>,
    },
    /// Acknowledge an active alert
    Ack {
        /// Alert ID or unambiguous prefix
        id: IdOrPrefix,
    },
    /// Resolve an alert
    Resolve {
        /// Alert ID or unambiguous prefix
        id: IdOrPrefix,
    },
}

pub async fn handle_alert_command(command: AlertCommands, client: &PipewatchClient) -> Result<()> {
    match command {
        AlertCommands::List { status, pipeline } => {
            let pipeline_id = match pipeline {
                Some(p) => Some(resolve_pipeline_id(client, &p).await?),
                None => None,
            };
            let alerts = client
                .list_alerts(&AlertQuery {
                    status,
                    pipeline_id,
                })
                .await?;
            list_alerts(&alerts);
            Ok(())
        }
        AlertCommands::Create {
            severity,
            message,
            pipeline,
        } => {
            let pipeline_id = match pipeline {
                Some(p) => Some(resolve_pipeline_id(client, &p).await?),
                None => None,
            };
            let alert = client
                .create_alert(CreateAlert {
                    pipeline_id,
                    severity,
                    message,
                })
                .await?;

            println!("{}", "✓ Alert raised".green().bold());
            println!("  ID: {}", alert.id.to_string().cyan());
            Ok(())
        }
        AlertCommands::Ack { id } => set_status(client, &id, AlertStatus::Acknowledged).await,
        AlertCommands::Resolve { id } => set_status(client, &id, AlertStatus::Resolved).await,
    }
}

async fn set_status(client: &PipewatchClient, id: &IdOrPrefix, status: AlertStatus) -> Result<()> {
    let alert_id = resolve_alert_id(client, id).await?;
    let changed = client.update_alert_status(alert_id, status).await?;

    println!(
        "{} {} is now {}",
        "✓".green().bold(),
        changed.id.to_string().cyan(),
        display::alert_status(changed.status)
    );

    Ok(())
}

fn list_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("{}", "No alerts.".green());
        return;
    }

    for alert in alerts {
        println!(
            "  {} [{}] {}",
            "▸".cyan(),
            display::alert_severity(alert.severity),
            alert.message.bold()
        );
        println!("    ID:        {}", alert.id.to_string().dimmed());
        println!(
            "    Pipeline:  {}",
            alert.pipeline_name.as_deref().unwrap_or("(global)")
        );
        println!("    Status:    {}", display::alert_status(alert.status));
        println!("    Triggered: {}", display::timestamp(alert.triggered_at));
        if let Some(resolved) = alert.resolved_at {
            println!("    Resolved:  {}", display::timestamp(resolved));
        }
        println!();
    }
}
