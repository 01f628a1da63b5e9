//! Pipeline Repository
//!
//! Handles all database operations related to pipelines.

use chrono::{DateTime, Utc};
use pipewatch_core::domain::pipeline::{Pipeline, PipelineStatus};
use pipewatch_core::domain::run::Run;
use pipewatch_core::dto::pipeline::CreatePipeline;
use sqlx::PgPool;
use uuid::Uuid;

use super::{decode_status, run::RunRow};

/// Filter applied to pipeline listings
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineFilter {
    pub status: Option<PipelineStatus>,
}

/// Create a new pipeline in the database
pub async fn create(pool: &PgPool, req: CreatePipeline) -> Result<Pipeline, sqlx::Error> {
    let now = Utc::now();

    let pipeline = Pipeline {
        id: Uuid::new_v4(),
        name: req.name,
        description: req.description,
        status: req.status.unwrap_or_default(),
        schedule: req.schedule,
        source: req.source,
        destination: req.destination,
        item_unit: req.item_unit,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO pipelines (
            id, name, description, status, schedule, source, destination,
            item_unit, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(pipeline.id)
    .bind(&pipeline.name)
    .bind(&pipeline.description)
    .bind(pipeline.status.as_str())
    .bind(&pipeline.schedule)
    .bind(&pipeline.source)
    .bind(&pipeline.destination)
    .bind(&pipeline.item_unit)
    .bind(pipeline.created_at)
    .bind(pipeline.updated_at)
    .execute(pool)
    .await?;

    Ok(pipeline)
}

/// Find a pipeline by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Pipeline>, sqlx::Error> {
    let row = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, name, description, status, schedule, source, destination,
               item_unit, created_at, updated_at
        FROM pipelines
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Pipeline::try_from).transpose()
}

/// Check whether a pipeline exists without loading it
pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM pipelines WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// List pipelines, oldest first
pub async fn list(pool: &PgPool, filter: PipelineFilter) -> Result<Vec<Pipeline>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PipelineRow>(
        r#"
        SELECT id, name, description, status, schedule, source, destination,
               item_unit, created_at, updated_at
        FROM pipelines
        WHERE ($1::varchar IS NULL OR status = $1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(filter.status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Pipeline::try_from).collect()
}

/// List pipelines together with their most recent run, if any
pub async fn list_with_last_run(
    pool: &PgPool,
    filter: PipelineFilter,
) -> Result<Vec<(Pipeline, Option<Run>)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PipelineWithRunRow>(
        r#"
        SELECT p.id, p.name, p.description, p.status, p.schedule, p.source,
               p.destination, p.item_unit, p.created_at, p.updated_at,
               r.id AS run_id, r.status AS run_status, r.started_at AS run_started_at,
               r.finished_at AS run_finished_at, r.duration_ms AS run_duration_ms,
               r.items_processed AS run_items_processed,
               r.error_message AS run_error_message, r.created_at AS run_created_at
        FROM pipelines p
        LEFT JOIN LATERAL (
            SELECT *
            FROM pipeline_runs
            WHERE pipeline_id = p.id
            ORDER BY started_at DESC, id DESC
            LIMIT 1
        ) r ON TRUE
        WHERE ($1::varchar IS NULL OR p.status = $1)
        ORDER BY p.created_at ASC
        "#,
    )
    .bind(filter.status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PipelineWithRunRow::split).collect()
}

/// Persist every mutable field of a pipeline
///
/// Only applies while the stored `updated_at` still equals `read_at`, the
/// value the change was computed from. Returns false otherwise.
pub async fn update(
    pool: &PgPool,
    pipeline: &Pipeline,
    read_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pipelines
        SET name = $1, description = $2, status = $3, schedule = $4, source = $5,
            destination = $6, item_unit = $7, updated_at = $8
        WHERE id = $9 AND updated_at = $10
        "#,
    )
    .bind(&pipeline.name)
    .bind(&pipeline.description)
    .bind(pipeline.status.as_str())
    .bind(&pipeline.schedule)
    .bind(&pipeline.source)
    .bind(&pipeline.destination)
    .bind(&pipeline.item_unit)
    .bind(pipeline.updated_at)
    .bind(pipeline.id)
    .bind(read_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    status: String,
    schedule: Option<String>,
    source: Option<String>,
    destination: Option<String>,
    item_unit: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PipelineRow> for Pipeline {
    type Error = sqlx::Error;

    fn try_from(row: PipelineRow) -> Result<Self, Self::Error> {
        Ok(Pipeline {
            id: row.id,
            name: row.name,
            description: row.description,
            status: decode_status(&row.status)?,
            schedule: row.schedule,
            source: row.source,
            destination: row.destination,
            item_unit: row.item_unit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PipelineWithRunRow {
    #[sqlx(flatten)]
    pipeline: PipelineRow,
    run_id: Option<Uuid>,
    run_status: Option<String>,
    run_started_at: Option<DateTime<Utc>>,
    run_finished_at: Option<DateTime<Utc>>,
    run_duration_ms: Option<i64>,
    run_items_processed: Option<i64>,
    run_error_message: Option<String>,
    run_created_at: Option<DateTime<Utc>>,
}

impl PipelineWithRunRow {
    fn split(self) -> Result<(Pipeline, Option<Run>), sqlx::Error> {
        let pipeline_id = self.pipeline.id;

        // The lateral join yields all-null run columns when there is no run
        let last_run = match (
            self.run_id,
            self.run_status,
            self.run_started_at,
            self.run_created_at,
        ) {
            (Some(id), Some(status), Some(started_at), Some(created_at)) => Some(
                RunRow {
                    id,
                    pipeline_id,
                    status,
                    started_at,
                    finished_at: self.run_finished_at,
                    duration_ms: self.run_duration_ms,
                    items_processed: self.run_items_processed,
                    error_message: self.run_error_message,
                    created_at,
                }
                .try_into()?,
            ),
            _ => None,
        };

        Ok((self.pipeline.try_into()?, last_run))
    }
}
