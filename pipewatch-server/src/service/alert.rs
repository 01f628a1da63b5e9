//! Alert Service
//!
//! Raising alerts and moving them through active, acknowledged and resolved.

use chrono::Utc;
use pipewatch_core::domain::alert::{Alert, AlertStatus};
use pipewatch_core::dto::alert::{AlertQuery, CreateAlert, UpdateAlertStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{alert_repository, pipeline_repository};

/// Service error type
#[derive(Debug)]
pub enum AlertError {
    NotFound(Uuid),
    PipelineNotFound(Uuid),
    ValidationError(String),
    InvalidState(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for AlertError {
    fn from(err: sqlx::Error) -> Self {
        AlertError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, AlertError>;

/// List alerts, newest first
pub async fn list_alerts(pool: &PgPool, query: AlertQuery) -> Result<Vec<Alert>> {
    Ok(alert_repository::list(pool, &query).await?)
}

/// Raise a new alert, optionally tied to a pipeline
pub async fn create_alert(pool: &PgPool, req: CreateAlert) -> Result<Alert> {
    if req.message.trim().is_empty() {
        return Err(AlertError::ValidationError(
            "Missing required field: message".to_string(),
        ));
    }

    if let Some(pipeline_id) = req.pipeline_id {
        if !pipeline_repository::exists(pool, pipeline_id).await? {
            return Err(AlertError::PipelineNotFound(pipeline_id));
        }
    }

    let alert = alert_repository::create(pool, req).await?;

    tracing::info!(
        "Alert {} raised ({}): {}",
        alert.id,
        alert.severity,
        alert.message
    );

    Ok(alert)
}

/// Move an alert to a new status
///
/// Setting the current status again succeeds without writing anything.
pub async fn update_alert_status(
    pool: &PgPool,
    id: Uuid,
    req: UpdateAlertStatus,
) -> Result<Alert> {
    let next = req.status.ok_or_else(|| {
        AlertError::ValidationError(
            "status must be: active, acknowledged, or resolved".to_string(),
        )
    })?;

    let mut alert = alert_repository::find_by_id(pool, id)
        .await?
        .ok_or(AlertError::NotFound(id))?;

    let from = alert.status;
    let changed = alert
        .transition(next, Utc::now())
        .map_err(|err| AlertError::InvalidState(err.to_string()))?;

    if changed {
        if !alert_repository::update_status(pool, &alert, from).await? {
            return Err(lost_update(pool, id, from).await?);
        }
        tracing::info!("Alert {} is now {}", id, alert.status);
    } else {
        tracing::debug!("Alert {} already {}", id, alert.status);
    }

    Ok(alert)
}

/// Explain why a guarded status write matched no row
async fn lost_update(pool: &PgPool, id: Uuid, from: AlertStatus) -> Result<AlertError> {
    let current = alert_repository::find_by_id(pool, id).await?;

    Ok(match current {
        None => AlertError::NotFound(id),
        Some(current) => {
            tracing::warn!(
                "Alert {} moved from {} to {} during the update",
                id,
                from,
                current.status
            );
            AlertError::InvalidState(format!(
                "Alert was changed concurrently and is now {}",
                current.status
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use pipewatch_core::domain::alert::AlertSeverity;

    async fn raise(pool: &PgPool) -> Alert {
        create_alert(
            pool,
            CreateAlert {
                pipeline_id: None,
                severity: AlertSeverity::Warning,
                message: "Row count dropped by 80%".to_string(),
            },
        )
        .await
        .unwrap()
    }

    fn status(status: AlertStatus) -> UpdateAlertStatus {
        UpdateAlertStatus {
            status: Some(status),
        }
    }

    #[tokio::test]
    #[ignore = "requires a Postgres database (DATABASE_URL)"]
    async fn test_stale_write_cannot_reopen_resolved_alert() {
        let pool = test_pool().await;
        let raised = raise(&pool).await;

        // Two readers see the alert while it is still active
        let mut first = alert_repository::find_by_id(&pool, raised.id).await.unwrap().unwrap();
        let mut stale = alert_repository::find_by_id(&pool, raised.id).await.unwrap().unwrap();

        first.transition(AlertStatus::Resolved, Utc::now()).unwrap();
        assert!(
            alert_repository::update_status(&pool, &first, AlertStatus::Active)
                .await
                .unwrap()
        );

        stale.transition(AlertStatus::Acknowledged, Utc::now()).unwrap();
        assert!(
            !alert_repository::update_status(&pool, &stale, AlertStatus::Active)
                .await
                .unwrap()
        );

        let stored = alert_repository::find_by_id(&pool, raised.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::Resolved);
        assert_eq!(stored.resolved_at, first.resolved_at);
    }

    #[tokio::test]
    #[ignore = "requires a Postgres database (DATABASE_URL)"]
    async fn test_resolved_alert_rejects_further_changes() {
        let pool = test_pool().await;
        let raised = raise(&pool).await;

        let resolved = update_alert_status(&pool, raised.id, status(AlertStatus::Resolved))
            .await
            .unwrap();
        assert!(resolved.resolved_at.is_some());

        let err = update_alert_status(&pool, raised.id, status(AlertStatus::Acknowledged))
            .await
            .unwrap_err();
        assert!(matches!(err, AlertError::InvalidState(_)));

        let stored = alert_repository::find_by_id(&pool, raised.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::Resolved);
        assert_eq!(stored.resolved_at, resolved.resolved_at);
    }

    #[tokio::test]
    #[ignore = "requires a Postgres database (DATABASE_URL)"]
    async fn test_lost_update_reports_current_state() {
        let pool = test_pool().await;
        let raised = raise(&pool).await;
        update_alert_status(&pool, raised.id, status(AlertStatus::Resolved))
            .await
            .unwrap();

        let err = lost_update(&pool, raised.id, AlertStatus::Active).await.unwrap();
        match err {
            AlertError::InvalidState(msg) => assert!(msg.contains("resolved")),
            other => panic!("expected InvalidState, got {other:?}"),
        }

        let missing = lost_update(&pool, Uuid::new_v4(), AlertStatus::Active).await.unwrap();
        assert!(matches!(missing, AlertError::NotFound(_)));
    }
}
