//! Run API Handlers

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use pipewatch_core::dto::run::{RunStarted, RunStatusView, StartRun};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::run_service;

/// POST /api/runs
/// Open a running run that an external system will complete
pub async fn start_run(
    State(pool): State<PgPool>,
    payload: Result<Json<StartRun>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RunStarted>)> {
    let Json(req) = payload?;

    let run = run_service::start_run(&pool, req.job_id).await?;

    Ok((StatusCode::CREATED, Json(RunStarted { run_id: run.id })))
}

/// GET /api/runs/{id}
pub async fn get_run(
    State(pool): State<PgPool>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<RunStatusView>> {
    let Path(id) = path?;
    tracing::debug!("Getting run: {}", id);

    let run = run_service::get_run(&pool, id).await?;

    Ok(Json(run.into()))
}
