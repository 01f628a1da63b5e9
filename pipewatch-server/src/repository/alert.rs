//! Alert Repository
//!
//! Handles all database operations related to alerts.

use chrono::{DateTime, Utc};
use pipewatch_core::domain::alert::{Alert, AlertStatus};
use pipewatch_core::dto::alert::{AlertQuery, CreateAlert};
use sqlx::PgPool;
use uuid::Uuid;

use super::decode_status;

/// Raise a new alert in the `active` state
pub async fn create(pool: &PgPool, req: CreateAlert) -> Result<Alert, sqlx::Error> {
    let alert = Alert {
        id: Uuid::new_v4(),
        pipeline_id: req.pipeline_id,
        pipeline_name: None,
        severity: req.severity,
        message: req.message,
        status: AlertStatus::Active,
        triggered_at: Utc::now(),
        resolved_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO alerts (id, pipeline_id, severity, message, status, triggered_at, resolved_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(alert.id)
    .bind(alert.pipeline_id)
    .bind(alert.severity.as_str())
    .bind(&alert.message)
    .bind(alert.status.as_str())
    .bind(alert.triggered_at)
    .bind(alert.resolved_at)
    .execute(pool)
    .await?;

    Ok(alert)
}

/// Find an alert by ID, with its pipeline's name
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Alert>, sqlx::Error> {
    let row = sqlx::query_as::<_, AlertRow>(
        r#"
        SELECT a.id, a.pipeline_id, p.name AS pipeline_name, a.severity, a.message,
               a.status, a.triggered_at, a.resolved_at
        FROM alerts a
        LEFT JOIN pipelines p ON p.id = a.pipeline_id
        WHERE a.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Alert::try_from).transpose()
}

/// List alerts, most recently triggered first
pub async fn list(pool: &PgPool, query: &AlertQuery) -> Result<Vec<Alert>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AlertRow>(
        r#"
        SELECT a.id, a.pipeline_id, p.name AS pipeline_name, a.severity, a.message,
               a.status, a.triggered_at, a.resolved_at
        FROM alerts a
        LEFT JOIN pipelines p ON p.id = a.pipeline_id
        WHERE ($1::varchar IS NULL OR a.status = $1)
          AND ($2::uuid IS NULL OR a.pipeline_id = $2)
        ORDER BY a.triggered_at DESC
        "#,
    )
    .bind(query.status.map(|s| s.as_str()))
    .bind(query.pipeline_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Alert::try_from).collect()
}

/// Persist an alert's status and resolution time
///
/// The write only applies while the stored status is still `from`. Returns
/// false when the alert is gone or another update moved it first.
pub async fn update_status(
    pool: &PgPool,
    alert: &Alert,
    from: AlertStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE alerts SET status = $1, resolved_at = $2 WHERE id = $3 AND status = $4",
    )
    .bind(alert.status.as_str())
    .bind(alert.resolved_at)
    .bind(alert.id)
    .bind(from.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct AlertRow {
    id: Uuid,
    pipeline_id: Option<Uuid>,
    pipeline_name: Option<String>,
    severity: String,
    message: String,
    status: String,
    triggered_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = sqlx::Error;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            id: row.id,
            pipeline_id: row.pipeline_id,
            pipeline_name: row.pipeline_name,
            severity: decode_status(&row.severity)?,
            message: row.message,
            status: decode_status(&row.status)?,
            triggered_at: row.triggered_at,
            resolved_at: row.resolved_at,
        })
    }
}
