//! Dashboard and trend command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use pipewatch_client::PipewatchClient;

use crate::display;

const BAR_WIDTH: usize = 30;

#[derive(Subcommand)]
pub enum MetricsCommands {
    /// Hourly average and p95 duration over the last 24 hours
    Latency,
    /// Daily run outcomes over the last 7 days
    Volume,
}

pub async fn show_stats(client: &PipewatchClient) -> Result<()> {
    let stats = client.dashboard().await?;

    println!("{}", "Dashboard:".bold());
    println!(
        "  Pipelines:         {} ({} active)",
        stats.total_pipelines, stats.active_pipelines
    );
    println!(
        "  Success rate (7d): {}",
        display::success_rate(Some(stats.success_rate_7d))
    );
    let failed = stats.failed_runs_24h.to_string();
    println!(
        "  Failed runs (24h): {}",
        if stats.failed_runs_24h > 0 {
            failed.red()
        } else {
            failed.green()
        }
    );
    println!(
        "  Avg latency:       {}",
        display::duration(Some(stats.avg_latency_ms))
    );
    let alerts = stats.active_alerts.to_string();
    println!(
        "  Active alerts:     {}",
        if stats.active_alerts > 0 {
            alerts.red()
        } else {
            alerts.green()
        }
    );

    Ok(())
}

pub async fn handle_metrics_command(
    command: MetricsCommands,
    client: &PipewatchClient,
) -> Result<()> {
    match command {
        MetricsCommands::Latency => {
            let points = client.latency_trend().await?;
            let max = points.iter().map(|p| p.p95_ms.max(0) as u64).max().unwrap_or(0);

            println!("{}", "Latency (last 24h):".bold());
            println!("  {:<6} {:>9} {:>9}", "hour", "avg", "p95");
            for point in &points {
                println!(
                    "  {:<6} {:>9} {:>9} {}",
                    point.hour_label,
                    display::duration(Some(point.avg_ms)),
                    display::duration(Some(point.p95_ms)),
                    display::bar(point.p95_ms.max(0) as u64, max, BAR_WIDTH).cyan()
                );
            }
        }
        MetricsCommands::Volume => {
            let points = client.volume_trend().await?;
            let max = points.iter().map(|p| p.total()).max().unwrap_or(0);

            println!("{}", "Run volume (last 7 days):".bold());
            println!(
                "  {:<12} {:>7} {:>7} {:>7}",
                "day", "success", "failed", "skipped"
            );
            for point in &points {
                println!(
                    "  {:<12} {:>7} {:>7} {:>7} {}",
                    point.day_label,
                    point.success,
                    point.failed,
                    point.skipped,
                    display::bar(point.total(), max, BAR_WIDTH).green()
                );
            }
        }
    }

    Ok(())
}
