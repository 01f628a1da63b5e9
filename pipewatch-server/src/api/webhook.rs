//! Webhook API Handler
//!
//! Completion callbacks from the pipeline execution system.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use pipewatch_core::dto::run::{PipelineWebhook, WebhookAck};
use sqlx::PgPool;

use crate::api::error::ApiResult;
use crate::service::run_service;

/// POST /api/webhooks/pipeline
pub async fn pipeline_webhook(
    State(pool): State<PgPool>,
    payload: Result<Json<PipelineWebhook>, JsonRejection>,
) -> ApiResult<Json<WebhookAck>> {
    let Json(hook) = payload?;
    tracing::info!(
        "Webhook received (run: {:?}, job: {:?}, status: {:?})",
        hook.run_id,
        hook.job_id,
        hook.status
    );

    let ack = run_service::handle_webhook(&pool, hook).await?;

    Ok(Json(ack))
}
