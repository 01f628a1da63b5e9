//! Alert API Handlers

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use pipewatch_core::domain::alert::Alert;
use pipewatch_core::dto::alert::{AlertQuery, AlertStatusChanged, CreateAlert, UpdateAlertStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::alert_service;

/// GET /api/alerts
/// List alerts, optionally filtered by status or pipeline
pub async fn list_alerts(
    State(pool): State<PgPool>,
    query: Result<Query<AlertQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Alert>>> {
    let Query(query) = query?;
    tracing::debug!("Listing alerts: {:?}", query);

    let alerts = alert_service::list_alerts(&pool, query).await?;

    Ok(Json(alerts))
}

/// POST /api/alerts
pub async fn create_alert(
    State(pool): State<PgPool>,
    payload: Result<Json<CreateAlert>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Alert>)> {
    let Json(req) = payload?;

    let alert = alert_service::create_alert(&pool, req).await?;

    Ok((StatusCode::CREATED, Json(alert)))
}

/// PATCH /api/alerts/{id}
/// Acknowledge or resolve an alert
pub async fn update_alert(
    State(pool): State<PgPool>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateAlertStatus>, JsonRejection>,
) -> ApiResult<Json<AlertStatusChanged>> {
    let Path(id) = path?;
    let Json(req) = payload?;

    let alert = alert_service::update_alert_status(&pool, id, req).await?;

    Ok(Json(AlertStatusChanged {
        id: alert.id,
        status: alert.status,
    }))
}
