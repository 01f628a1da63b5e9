//! Pipeline domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::ParseStatusError;

/// Pipeline definition
///
/// Inert metadata describing a unit of data movement. Pipewatch never
/// executes pipelines, it only records and summarizes their runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: PipelineStatus,
    /// Cron-style schedule expression, informational only
    pub schedule: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    /// Unit label for processed-item counts (e.g. "rows", "events")
    pub item_unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pipeline lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    #[default]
    Active,
    Inactive,
    Deprecated,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Active => "active",
            PipelineStatus::Inactive => "inactive",
            PipelineStatus::Deprecated => "deprecated",
        }
    }
}

impl FromStr for PipelineStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PipelineStatus::Active),
            "inactive" => Ok(PipelineStatus::Inactive),
            "deprecated" => Ok(PipelineStatus::Deprecated),
            other => Err(ParseStatusError::new(
                "pipeline",
                other,
                "active, inactive, deprecated",
            )),
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
