//! Pipeline DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::alert::Alert;
use crate::domain::pipeline::{Pipeline, PipelineStatus};
use crate::domain::run::Run;
use crate::dto::FieldPatch;
use crate::health::PipelineRollup;

/// Request to register a new pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePipeline {
    /// Required; an absent name is reported as a validation error
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `active`
    pub status: Option<PipelineStatus>,
    pub schedule: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub item_unit: Option<String>,
}

/// Response to a pipeline creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCreated {
    pub id: Uuid,
    pub name: String,
}

/// Partial update of a pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePipeline {
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub name: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub description: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub status: FieldPatch<PipelineStatus>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub schedule: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub source: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub destination: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub item_unit: FieldPatch<String>,
}

impl UpdatePipeline {
    pub fn is_empty(&self) -> bool {
        self.name.is_unchanged()
            && self.description.is_unchanged()
            && self.status.is_unchanged()
            && self.schedule.is_unchanged()
            && self.source.is_unchanged()
            && self.destination.is_unchanged()
            && self.item_unit.is_unchanged()
    }
}

/// Response to a pipeline update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineUpdated {
    pub id: Uuid,
    pub name: String,
    pub status: PipelineStatus,
}

/// A pipeline listed together with its health rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    #[serde(flatten)]
    pub pipeline: Pipeline,
    #[serde(flatten)]
    pub rollup: PipelineRollup,
}

/// Everything shown on a single pipeline's page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDetail {
    pub pipeline: Pipeline,
    /// Rollup over `recent_runs` only
    pub rollup: PipelineRollup,
    pub recent_runs: Vec<Run>,
    pub alerts: Vec<Alert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_without_name_deserializes() {
        let req: CreatePipeline = serde_json::from_str(r#"{"source": "Kafka"}"#).unwrap();
        assert!(req.name.is_empty());
        assert_eq!(req.source.as_deref(), Some("Kafka"));
        assert!(req.status.is_none());
    }

    #[test]
    fn test_update_distinguishes_null_and_absent() {
        let req: UpdatePipeline =
            serde_json::from_str(r#"{"schedule": null, "status": "deprecated"}"#).unwrap();
        assert_eq!(req.schedule, FieldPatch::Clear);
        assert_eq!(req.status, FieldPatch::Set(PipelineStatus::Deprecated));
        assert_eq!(req.source, FieldPatch::Unchanged);
        assert!(!req.is_empty());
    }

    #[test]
    fn test_update_rejects_unknown_status() {
        let result = serde_json::from_str::<UpdatePipeline>(r#"{"status": "paused"}"#);
        assert!(result.is_err());
    }
}
