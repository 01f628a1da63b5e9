//! Pipeline Service
//!
//! Business logic for pipeline registration, patching and health views.

use chrono::{DateTime, Utc};
use pipewatch_core::domain::pipeline::Pipeline;
use pipewatch_core::dto::FieldPatch;
use pipewatch_core::dto::alert::AlertQuery;
use pipewatch_core::dto::pipeline::{
    CreatePipeline, PipelineDetail, PipelineSummary, UpdatePipeline,
};
use pipewatch_core::health;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::pipeline::PipelineFilter;
use crate::repository::run::RunFilter;
use crate::repository::{alert_repository, pipeline_repository, run_repository};

/// Number of runs shown on a pipeline's detail page
pub const RECENT_RUNS_LIMIT: i64 = 50;

const MAX_NAME_LEN: usize = 255;

/// Re-reads allowed when a concurrent update lands between read and write
const UPDATE_ATTEMPTS: usize = 3;

/// Service error type
#[derive(Debug)]
pub enum PipelineError {
    NotFound(Uuid),
    ValidationError(String),
    Conflict(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Register a new pipeline
pub async fn create_pipeline(pool: &PgPool, req: CreatePipeline) -> Result<Pipeline> {
    validate_name(&req.name)?;

    let pipeline = pipeline_repository::create(pool, req).await?;

    tracing::info!("Pipeline created: {} ({})", pipeline.name, pipeline.id);

    Ok(pipeline)
}

/// Get a pipeline by ID
pub async fn get_pipeline(pool: &PgPool, id: Uuid) -> Result<Pipeline> {
    pipeline_repository::find_by_id(pool, id)
        .await?
        .ok_or(PipelineError::NotFound(id))
}

/// List pipelines with their all-time health rollup
pub async fn list_pipelines(
    pool: &PgPool,
    filter: PipelineFilter,
) -> Result<Vec<PipelineSummary>> {
    let pipelines = pipeline_repository::list_with_last_run(pool, filter).await?;
    if pipelines.is_empty() {
        return Ok(Vec::new());
    }

    let ids = pipelines.iter().map(|(p, _)| p.id).collect();
    let runs = run_repository::list(
        pool,
        &RunFilter {
            pipeline_ids: Some(ids),
            ..RunFilter::default()
        },
    )
    .await?;
    let mut by_pipeline = health::group_by_pipeline(runs);

    let summaries = pipelines
        .into_iter()
        .map(|(pipeline, last_run)| {
            let runs = by_pipeline.remove(&pipeline.id).unwrap_or_default();
            let mut rollup = health::rollup(&runs);
            rollup.last_run = last_run;
            PipelineSummary { pipeline, rollup }
        })
        .collect();

    Ok(summaries)
}

/// Pipeline page: recent runs, their rollup and the pipeline's alerts
pub async fn get_pipeline_detail(pool: &PgPool, id: Uuid) -> Result<PipelineDetail> {
    let pipeline = get_pipeline(pool, id).await?;

    let recent_runs = run_repository::list(
        pool,
        &RunFilter {
            limit: Some(RECENT_RUNS_LIMIT),
            ..RunFilter::for_pipeline(id)
        },
    )
    .await?;

    let alerts = alert_repository::list(
        pool,
        &AlertQuery {
            pipeline_id: Some(id),
            ..AlertQuery::default()
        },
    )
    .await?;

    Ok(PipelineDetail {
        rollup: health::rollup(&recent_runs),
        pipeline,
        recent_runs,
        alerts,
    })
}

/// Apply a partial update to a pipeline
///
/// The patch is merged into a fresh read and written only if nothing else
/// updated the pipeline in between; on a collision it is re-applied.
pub async fn update_pipeline(pool: &PgPool, id: Uuid, patch: UpdatePipeline) -> Result<Pipeline> {
    for attempt in 1..=UPDATE_ATTEMPTS {
        let existing = get_pipeline(pool, id).await?;
        let read_at = existing.updated_at;

        let pipeline = apply_patch(existing, patch.clone(), Utc::now())?;

        if pipeline_repository::update(pool, &pipeline, read_at).await? {
            tracing::info!("Pipeline updated: {} ({})", pipeline.name, pipeline.id);
            return Ok(pipeline);
        }

        tracing::debug!("Pipeline {} changed during update (attempt {})", id, attempt);
    }

    tracing::warn!("Giving up on pipeline {} update after {} attempts", id, UPDATE_ATTEMPTS);
    Err(PipelineError::Conflict(
        "Pipeline is being updated concurrently, try again".to_string(),
    ))
}

// =============================================================================
// Validation
// =============================================================================

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Missing required field: name".to_string(),
        ));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(PipelineError::ValidationError(format!(
            "Pipeline name is too long (max {MAX_NAME_LEN} characters)"
        )));
    }

    Ok(())
}

/// Merge a patch into a pipeline, field by field
fn apply_patch(mut pipeline: Pipeline, patch: UpdatePipeline, now: DateTime<Utc>) -> Result<Pipeline> {
    match patch.name {
        FieldPatch::Unchanged => {}
        FieldPatch::Clear => {
            return Err(PipelineError::ValidationError(
                "name cannot be null".to_string(),
            ));
        }
        FieldPatch::Set(name) => {
            validate_name(&name)?;
            pipeline.name = name;
        }
    }

    match patch.status {
        FieldPatch::Unchanged => {}
        FieldPatch::Clear => {
            return Err(PipelineError::ValidationError(
                "status must be: active, inactive, or deprecated".to_string(),
            ));
        }
        FieldPatch::Set(status) => pipeline.status = status,
    }

    pipeline.description = patch.description.apply_to(pipeline.description);
    pipeline.schedule = patch.schedule.apply_to(pipeline.schedule);
    pipeline.source = patch.source.apply_to(pipeline.source);
    pipeline.destination = patch.destination.apply_to(pipeline.destination);
    pipeline.item_unit = patch.item_unit.apply_to(pipeline.item_unit);
    pipeline.updated_at = now;

    Ok(pipeline)
}
