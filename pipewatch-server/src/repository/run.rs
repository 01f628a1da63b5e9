//! Run Repository
//!
//! Handles all database operations related to pipeline runs.

use chrono::{DateTime, Utc};
use pipewatch_core::domain::run::{Run, RunStatus};
use pipewatch_core::dto::run::RunCompletion;
use pipewatch_core::health::DurationTotals;
use sqlx::PgPool;
use uuid::Uuid;

use super::decode_status;

/// Filter applied to run listings
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    /// Restrict to these pipelines
    pub pipeline_ids: Option<Vec<Uuid>>,
    /// Only runs started at or after this instant
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl RunFilter {
    pub fn for_pipeline(pipeline_id: Uuid) -> Self {
        Self {
            pipeline_ids: Some(vec![pipeline_id]),
            ..Self::default()
        }
    }

    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            ..Self::default()
        }
    }
}

/// Create a run in the `running` state, started now
pub async fn create_running(pool: &PgPool, pipeline_id: Uuid) -> Result<Run, sqlx::Error> {
    let now = Utc::now();

    let run = Run {
        id: Uuid::new_v4(),
        pipeline_id,
        status: RunStatus::Running,
        started_at: now,
        finished_at: None,
        duration_ms: None,
        items_processed: None,
        error_message: None,
        created_at: now,
    };

    insert(pool, &run).await?;

    Ok(run)
}

/// Record a run that started and finished outside of Pipewatch
pub async fn create_completed(
    pool: &PgPool,
    pipeline_id: Uuid,
    started_at: DateTime<Utc>,
    completion: &RunCompletion,
) -> Result<Run, sqlx::Error> {
    let run = Run {
        id: Uuid::new_v4(),
        pipeline_id,
        status: completion.status,
        started_at,
        finished_at: Some(completion.finished_at),
        duration_ms: completion.duration_ms,
        items_processed: completion.items_processed,
        error_message: completion.error_message.clone(),
        created_at: Utc::now(),
    };

    insert(pool, &run).await?;

    Ok(run)
}

async fn insert(pool: &PgPool, run: &Run) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO pipeline_runs (
            id, pipeline_id, status, started_at, finished_at, duration_ms,
            items_processed, error_message, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(run.id)
    .bind(run.pipeline_id)
    .bind(run.status.as_str())
    .bind(run.started_at)
    .bind(run.finished_at)
    .bind(run.duration_ms)
    .bind(run.items_processed)
    .bind(&run.error_message)
    .bind(run.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find a run by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Run>, sqlx::Error> {
    let row = sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, pipeline_id, status, started_at, finished_at, duration_ms,
               items_processed, error_message, created_at
        FROM pipeline_runs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Run::try_from).transpose()
}

/// List runs, newest first
pub async fn list(pool: &PgPool, filter: &RunFilter) -> Result<Vec<Run>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, pipeline_id, status, started_at, finished_at, duration_ms,
               items_processed, error_message, created_at
        FROM pipeline_runs
        WHERE ($1::uuid[] IS NULL OR pipeline_id = ANY($1))
          AND ($2::timestamptz IS NULL OR started_at >= $2)
        ORDER BY started_at DESC, id DESC
        LIMIT $3
        "#,
    )
    .bind(filter.pipeline_ids.as_deref())
    .bind(filter.since)
    .bind(filter.limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Run::try_from).collect()
}

/// All-time sum and count of successful run durations
pub async fn success_duration_totals(pool: &PgPool) -> Result<DurationTotals, sqlx::Error> {
    let (sum_ms, count): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(duration_ms), 0)::bigint, COUNT(duration_ms)
        FROM pipeline_runs
        WHERE status = 'success' AND duration_ms IS NOT NULL
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(DurationTotals { sum_ms, count })
}

/// Move a running run into its terminal state
///
/// Returns false when the run does not exist or has already completed, so a
/// run is only ever completed once.
pub async fn complete(
    pool: &PgPool,
    id: Uuid,
    completion: &RunCompletion,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pipeline_runs
        SET status = $1, finished_at = $2, duration_ms = $3,
            items_processed = $4, error_message = $5
        WHERE id = $6 AND status = 'running'
        "#,
    )
    .bind(completion.status.as_str())
    .bind(completion.finished_at)
    .bind(completion.duration_ms)
    .bind(completion.items_processed)
    .bind(&completion.error_message)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
pub(super) struct RunRow {
    pub(super) id: Uuid,
    pub(super) pipeline_id: Uuid,
    pub(super) status: String,
    pub(super) started_at: DateTime<Utc>,
    pub(super) finished_at: Option<DateTime<Utc>>,
    pub(super) duration_ms: Option<i64>,
    pub(super) items_processed: Option<i64>,
    pub(super) error_message: Option<String>,
    pub(super) created_at: DateTime<Utc>,
}

impl TryFrom<RunRow> for Run {
    type Error = sqlx::Error;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        Ok(Run {
            id: row.id,
            pipeline_id: row.pipeline_id,
            status: decode_status(&row.status)?,
            started_at: row.started_at,
            finished_at: row.finished_at,
            duration_ms: row.duration_ms,
            items_processed: row.items_processed,
            error_message: row.error_message,
            created_at: row.created_at,
        })
    }
}
