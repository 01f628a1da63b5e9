//! Run DTOs
//!
//! Payloads for starting runs and for the completion webhook posted by the
//! external execution system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::run::{Run, RunStatus};

/// Request to start a run for a pipeline
///
/// The pipeline id travels as `jobId` for compatibility with existing callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRun {
    pub job_id: Option<Uuid>,
}

/// Response to a run start or retry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStarted {
    pub run_id: Uuid,
}

/// Compact run status view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusView {
    pub id: Uuid,
    pub status: RunStatus,
    pub duration_ms: Option<i64>,
    pub rows_processed: Option<i64>,
    pub error_message: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<Run> for RunStatusView {
    fn from(run: Run) -> Self {
        Self {
            id: run.id,
            status: run.status,
            duration_ms: run.duration_ms,
            rows_processed: run.items_processed,
            error_message: run.error_message,
            finished_at: run.finished_at,
        }
    }
}

/// Completion callback from the execution system
///
/// Either `run_id` (complete an existing run) or `job_id` (record a run that
/// happened entirely outside Pipewatch) must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineWebhook {
    pub run_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub status: Option<RunStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub rows_processed: Option<i64>,
    pub items_processed: Option<i64>,
    pub error_message: Option<String>,
}

impl PipelineWebhook {
    /// Item count, preferring `itemsProcessed` over the legacy `rowsProcessed`
    pub fn items(&self) -> Option<i64> {
        self.items_processed.or(self.rows_processed)
    }
}

/// Terminal fields applied when a run completes
#[derive(Debug, Clone, PartialEq)]
pub struct RunCompletion {
    pub status: RunStatus,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: Option<i64>,
    pub items_processed: Option<i64>,
    pub error_message: Option<String>,
}

/// Webhook acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}
