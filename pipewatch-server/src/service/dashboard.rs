//! Dashboard Service
//!
//! Loads the snapshots the fleet views are computed from. All arithmetic
//! lives in `pipewatch_core::health`.

use chrono::{DateTime, Local, TimeDelta, Utc};
use pipewatch_core::domain::alert::AlertStatus;
use pipewatch_core::dto::alert::AlertQuery;
use pipewatch_core::health::{self, DashboardStats, LatencyPoint, VolumePoint};
use sqlx::PgPool;

use crate::repository::pipeline::PipelineFilter;
use crate::repository::run::RunFilter;
use crate::repository::{alert_repository, pipeline_repository, run_repository};

/// Fleet-wide health as of `now`
pub async fn dashboard(pool: &PgPool, now: DateTime<Utc>) -> Result<DashboardStats, sqlx::Error> {
    let pipelines = pipeline_repository::list(pool, PipelineFilter::default()).await?;

    // The windowed figures look back at most a week; latency is all-time
    let since = now - TimeDelta::days(7);
    let runs = run_repository::list(pool, &RunFilter::since(since)).await?;
    let latency = run_repository::success_duration_totals(pool).await?;

    let alerts = alert_repository::list(
        pool,
        &AlertQuery {
            status: Some(AlertStatus::Active),
            ..AlertQuery::default()
        },
    )
    .await?;

    tracing::debug!(
        "Dashboard over {} pipelines, {} recent runs, {} active alerts",
        pipelines.len(),
        runs.len(),
        alerts.len()
    );

    Ok(health::dashboard_stats(&pipelines, &runs, latency, &alerts, now))
}

/// Hourly latency for the last day, labelled in server local time
pub async fn latency(pool: &PgPool, now: DateTime<Local>) -> Result<Vec<LatencyPoint>, sqlx::Error> {
    let since = now.with_timezone(&Utc) - TimeDelta::hours(health::LATENCY_WINDOW_HOURS as i64 + 1);
    let runs = run_repository::list(pool, &RunFilter::since(since)).await?;

    Ok(health::latency_trend(&runs, &now).collect())
}

/// Daily outcome counts for the last week, by server local calendar day
pub async fn volume(pool: &PgPool, now: DateTime<Local>) -> Result<Vec<VolumePoint>, sqlx::Error> {
    let since = now.with_timezone(&Utc) - TimeDelta::days(health::VOLUME_WINDOW_DAYS as i64 + 1);
    let runs = run_repository::list(pool, &RunFilter::since(since)).await?;

    Ok(health::run_volume_trend(&runs, &now))
}
