//! Run Service
//!
//! Starting runs, triggering retries and applying completion callbacks.

use chrono::{DateTime, TimeDelta, Utc};
use pipewatch_core::domain::run::{Run, RunStatus};
use pipewatch_core::dto::run::{PipelineWebhook, RunCompletion, WebhookAck};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{pipeline_repository, run_repository};
use crate::service::trigger::{RunTrigger, TriggerOutcome};

/// Reported and measured durations may differ by this much before we warn
const DURATION_TOLERANCE_MS: i64 = 5_000;

/// Service error type
#[derive(Debug)]
pub enum RunError {
    NotFound(Uuid),
    PipelineNotFound(Uuid),
    ValidationError(String),
    InvalidState(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for RunError {
    fn from(err: sqlx::Error) -> Self {
        RunError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, RunError>;

/// Get a run by ID
pub async fn get_run(pool: &PgPool, id: Uuid) -> Result<Run> {
    run_repository::find_by_id(pool, id)
        .await?
        .ok_or(RunError::NotFound(id))
}

/// Open a running run for a pipeline; an external system completes it later
pub async fn start_run(pool: &PgPool, pipeline_id: Option<Uuid>) -> Result<Run> {
    let pipeline_id = pipeline_id
        .ok_or_else(|| RunError::ValidationError("Missing required field: jobId".to_string()))?;

    ensure_pipeline(pool, pipeline_id).await?;

    let run = run_repository::create_running(pool, pipeline_id).await?;

    tracing::info!("Run {} started for pipeline {}", run.id, pipeline_id);

    Ok(run)
}

/// Open a running run and execute it in the background
///
/// Returns as soon as the run exists; the spawned task completes it.
pub async fn retry_pipeline(pool: &PgPool, trigger: &RunTrigger, pipeline_id: Uuid) -> Result<Run> {
    ensure_pipeline(pool, pipeline_id).await?;

    let run = run_repository::create_running(pool, pipeline_id).await?;

    tracing::info!(
        "Retry of pipeline {} started as run {} ({})",
        pipeline_id,
        run.id,
        if trigger.is_simulated() {
            "simulated"
        } else {
            "remote"
        }
    );

    let pool = pool.clone();
    let trigger = trigger.clone();
    let run_id = run.id;
    tokio::spawn(async move {
        let outcome = trigger.execute(pipeline_id).await;
        finish_triggered_run(&pool, run_id, outcome).await;
    });

    Ok(run)
}

async fn finish_triggered_run(pool: &PgPool, run_id: Uuid, outcome: TriggerOutcome) {
    let completion = RunCompletion {
        status: outcome.status,
        finished_at: Utc::now(),
        duration_ms: Some(outcome.duration_ms),
        items_processed: outcome.items_processed,
        error_message: outcome.error_message,
    };

    match run_repository::complete(pool, run_id, &completion).await {
        Ok(true) => tracing::info!("Run {} finished: {}", run_id, completion.status),
        Ok(false) => tracing::warn!(
            "Run {} was completed elsewhere before the trigger returned",
            run_id
        ),
        Err(err) => tracing::error!("Failed to record outcome of run {}: {:?}", run_id, err),
    }
}

/// Apply a completion callback from the execution system
pub async fn handle_webhook(pool: &PgPool, hook: PipelineWebhook) -> Result<WebhookAck> {
    let status = validate_webhook(&hook)?;
    let finished_at = Utc::now();

    if let Some(run_id) = hook.run_id {
        let completion = RunCompletion {
            status,
            finished_at,
            duration_ms: hook.duration_ms,
            items_processed: hook.items(),
            error_message: hook.error_message,
        };
        complete_run(pool, run_id, completion).await?;

        return Ok(WebhookAck {
            ok: true,
            run_id: None,
        });
    }

    if let Some(pipeline_id) = hook.job_id {
        ensure_pipeline(pool, pipeline_id).await?;

        let (started_at, duration_ms) =
            external_run_timing(hook.started_at, hook.duration_ms, finished_at);
        let completion = RunCompletion {
            status,
            finished_at,
            duration_ms: Some(duration_ms),
            items_processed: hook.items(),
            error_message: hook.error_message,
        };

        let run =
            run_repository::create_completed(pool, pipeline_id, started_at, &completion).await?;

        tracing::info!(
            "Recorded external run {} for pipeline {}: {}",
            run.id,
            pipeline_id,
            run.status
        );

        return Ok(WebhookAck {
            ok: true,
            run_id: Some(run.id),
        });
    }

    Err(RunError::ValidationError(
        "Provide either runId or jobId".to_string(),
    ))
}

/// Move a running run into a terminal state, exactly once
pub async fn complete_run(pool: &PgPool, run_id: Uuid, completion: RunCompletion) -> Result<Run> {
    let run = get_run(pool, run_id).await?;

    if run.status != RunStatus::Running {
        return Err(RunError::InvalidState(format!(
            "Run {} is already {}",
            run_id, run.status
        )));
    }

    if let Some(drift) = duration_drift_ms(run.started_at, &completion) {
        tracing::warn!(
            "Run {} reported duration {:?}ms, {}ms away from its wall-clock time",
            run_id,
            completion.duration_ms,
            drift
        );
    }

    // A concurrent completion wins the conditional update and we lose here
    if !run_repository::complete(pool, run_id, &completion).await? {
        return Err(RunError::InvalidState(format!(
            "Run {} is no longer running",
            run_id
        )));
    }

    tracing::info!("Run {} completed: {}", run_id, completion.status);

    Ok(Run {
        status: completion.status,
        finished_at: Some(completion.finished_at),
        duration_ms: completion.duration_ms,
        items_processed: completion.items_processed,
        error_message: completion.error_message,
        ..run
    })
}

async fn ensure_pipeline(pool: &PgPool, pipeline_id: Uuid) -> Result<()> {
    if !pipeline_repository::exists(pool, pipeline_id).await? {
        return Err(RunError::PipelineNotFound(pipeline_id));
    }
    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_webhook(hook: &PipelineWebhook) -> Result<RunStatus> {
    let status = hook.status.ok_or_else(|| {
        RunError::ValidationError("Missing required field: status".to_string())
    })?;

    if !status.is_terminal() {
        return Err(RunError::ValidationError(format!(
            "status must be: success, failed, or skipped (got {})",
            status
        )));
    }

    if hook.duration_ms.is_some_and(|ms| ms < 0) {
        return Err(RunError::ValidationError(
            "durationMs cannot be negative".to_string(),
        ));
    }

    if hook.items().is_some_and(|n| n < 0) {
        return Err(RunError::ValidationError(
            "itemsProcessed cannot be negative".to_string(),
        ));
    }

    Ok(status)
}

/// Start time and duration of a run reported only after it finished
///
/// A missing start is derived from the duration (or taken as `finished_at`),
/// a missing duration from the start.
fn external_run_timing(
    started_at: Option<DateTime<Utc>>,
    duration_ms: Option<i64>,
    finished_at: DateTime<Utc>,
) -> (DateTime<Utc>, i64) {
    let started_at = started_at
        .unwrap_or_else(|| finished_at - TimeDelta::milliseconds(duration_ms.unwrap_or(0)));
    let duration_ms = duration_ms.unwrap_or_else(|| (finished_at - started_at).num_milliseconds());

    (started_at, duration_ms)
}

/// How far a reported duration is from the wall-clock time, if beyond tolerance
fn duration_drift_ms(started_at: DateTime<Utc>, completion: &RunCompletion) -> Option<i64> {
    let reported = completion.duration_ms?;
    let measured = (completion.finished_at - started_at).num_milliseconds();
    let drift = (reported - measured).abs();

    (drift > DURATION_TOLERANCE_MS).then_some(drift)
}
