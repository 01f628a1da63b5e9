//! Alert DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::alert::{AlertSeverity, AlertStatus};

/// Request to raise a new alert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlert {
    pub pipeline_id: Option<Uuid>,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Request to move an alert through its lifecycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAlertStatus {
    pub status: Option<AlertStatus>,
}

/// Response to an alert status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertStatusChanged {
    pub id: Uuid,
    pub status: AlertStatus,
}

/// Query parameters accepted by the alert listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertQuery {
    pub status: Option<AlertStatus>,
    pub pipeline_id: Option<Uuid>,
}
