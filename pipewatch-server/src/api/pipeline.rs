//! Pipeline API Handlers
//!
//! Read-side pipeline views and manual retries.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use pipewatch_core::domain::pipeline::PipelineStatus;
use pipewatch_core::dto::pipeline::{PipelineDetail, PipelineSummary};
use pipewatch_core::dto::run::RunStarted;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::repository::pipeline::PipelineFilter;
use crate::service::{pipeline_service, run_service};

#[derive(Debug, Default, Deserialize)]
pub struct PipelineQuery {
    pub status: Option<PipelineStatus>,
}

/// GET /api/pipelines
/// List pipelines with their health rollup
pub async fn list_pipelines(
    State(pool): State<PgPool>,
    query: Result<Query<PipelineQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<PipelineSummary>>> {
    let Query(query) = query?;
    tracing::debug!("Listing pipelines (status: {:?})", query.status);

    let pipelines = pipeline_service::list_pipelines(
        &pool,
        PipelineFilter {
            status: query.status,
        },
    )
    .await?;

    Ok(Json(pipelines))
}

/// GET /api/pipelines/{id}
/// Pipeline detail with recent runs and alerts
pub async fn get_pipeline(
    State(pool): State<PgPool>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<PipelineDetail>> {
    let Path(id) = path?;
    tracing::debug!("Getting pipeline: {}", id);

    let detail = pipeline_service::get_pipeline_detail(&pool, id).await?;

    Ok(Json(detail))
}

/// POST /api/pipelines/{id}/retry
/// Start a new run and execute it in the background
pub async fn retry_pipeline(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<(StatusCode, Json<RunStarted>)> {
    let Path(id) = path?;
    tracing::info!("Retrying pipeline: {}", id);

    let run = run_service::retry_pipeline(&state.pool, &state.trigger, id).await?;

    Ok((StatusCode::ACCEPTED, Json(RunStarted { run_id: run.id })))
}
