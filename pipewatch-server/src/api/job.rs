//! Job API Handlers
//!
//! Pipeline registration and patching for external schedulers, which call
//! pipelines "jobs".

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use pipewatch_core::dto::pipeline::{CreatePipeline, PipelineCreated, PipelineUpdated, UpdatePipeline};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::pipeline_service;

/// POST /api/jobs
/// Register a pipeline
pub async fn create_job(
    State(pool): State<PgPool>,
    payload: Result<Json<CreatePipeline>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PipelineCreated>)> {
    let Json(req) = payload?;
    tracing::info!("Creating pipeline: {}", req.name);

    let pipeline = pipeline_service::create_pipeline(&pool, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(PipelineCreated {
            id: pipeline.id,
            name: pipeline.name,
        }),
    ))
}

/// PATCH /api/jobs/{id}
/// Partially update a pipeline
pub async fn update_job(
    State(pool): State<PgPool>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePipeline>, JsonRejection>,
) -> ApiResult<Json<PipelineUpdated>> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    tracing::info!("Updating pipeline: {}", id);

    let pipeline = pipeline_service::update_pipeline(&pool, id, patch).await?;

    Ok(Json(PipelineUpdated {
        id: pipeline.id,
        name: pipeline.name,
        status: pipeline.status,
    }))
}
