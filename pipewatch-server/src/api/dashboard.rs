//! Dashboard API Handlers
//!
//! Fleet statistics and trend series. Hour labels and calendar days use the
//! server's local time zone.

use axum::{Json, extract::State};
use chrono::{Local, Utc};
use pipewatch_core::health::{DashboardStats, LatencyPoint, VolumePoint};
use sqlx::PgPool;

use crate::api::error::ApiResult;
use crate::service::dashboard_service;

/// GET /api/dashboard
pub async fn dashboard(State(pool): State<PgPool>) -> ApiResult<Json<DashboardStats>> {
    let stats = dashboard_service::dashboard(&pool, Utc::now()).await?;
    Ok(Json(stats))
}

/// GET /api/metrics/latency
pub async fn latency(State(pool): State<PgPool>) -> ApiResult<Json<Vec<LatencyPoint>>> {
    let points = dashboard_service::latency(&pool, Local::now()).await?;
    Ok(Json(points))
}

/// GET /api/metrics/volume
pub async fn volume(State(pool): State<PgPool>) -> ApiResult<Json<Vec<VolumePoint>>> {
    let points = dashboard_service::volume(&pool, Local::now()).await?;
    Ok(Json(points))
}
