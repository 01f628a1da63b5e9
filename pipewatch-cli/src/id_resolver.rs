//! ID resolver module
//!
//! Lets users type a short, unambiguous prefix instead of a full UUID.
//! Prefixes are matched against the ids the server currently lists.

use std::convert::Infallible;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use pipewatch_client::PipewatchClient;
use pipewatch_core::dto::alert::AlertQuery;
use uuid::Uuid;

/// Identifier that can be either a full UUID or a prefix of one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrPrefix {
    Full(Uuid),
    Prefix(String),
}

impl FromStr for IdOrPrefix {
    type Err = Infallible;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match Uuid::parse_str(input) {
            Ok(uuid) => IdOrPrefix::Full(uuid),
            Err(_) => IdOrPrefix::Prefix(input.trim().to_lowercase()),
        })
    }
}

impl std::fmt::Display for IdOrPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdOrPrefix::Full(uuid) => write!(f, "{}", uuid),
            IdOrPrefix::Prefix(prefix) => write!(f, "{}", prefix),
        }
    }
}

/// Pick the single candidate whose id starts with `prefix`
fn match_prefix(
    kind: &str,
    prefix: &str,
    candidates: impl IntoIterator<Item = Uuid>,
) -> Result<Uuid> {
    if prefix.is_empty() {
        return Err(anyhow!("Empty {} ID", kind));
    }

    let matches: Vec<Uuid> = candidates
        .into_iter()
        .filter(|id| id.to_string().starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No {} found with ID starting with '{}'",
            kind,
            prefix
        )),
        [only] => Ok(*only),
        many => {
            let ids: Vec<String> = many.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                prefix,
                kind,
                ids.join(", ")
            ))
        }
    }
}

/// Resolve a pipeline ID or prefix to a full UUID
pub async fn resolve_pipeline_id(client: &PipewatchClient, id: &IdOrPrefix) -> Result<Uuid> {
    let prefix = match id {
        IdOrPrefix::Full(uuid) => return Ok(*uuid),
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let pipelines = client
        .list_pipelines(None)
        .await
        .context("Failed to fetch pipelines for ID resolution")?;

    match_prefix("pipeline", prefix, pipelines.iter().map(|p| p.pipeline.id))
}

/// Resolve an alert ID or prefix to a full UUID
pub async fn resolve_alert_id(client: &PipewatchClient, id: &IdOrPrefix) -> Result<Uuid> {
    let prefix = match id {
        IdOrPrefix::Full(uuid) => return Ok(*uuid),
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let alerts = client
        .list_alerts(&AlertQuery::default())
        .await
        .context("Failed to fetch alerts for ID resolution")?;

    match_prefix("alert", prefix, alerts.iter().map(|a| a.id))
}
