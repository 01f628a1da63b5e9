//! Run Trigger
//!
//! Starts a pipeline on the external execution system, or simulates one when
//! no execution API is configured. Triggering never fails as such: every
//! problem is folded into a failed [`TriggerOutcome`].

use std::ops::Range;
use std::time::{Duration, Instant};

use pipewatch_core::domain::run::RunStatus;
use rand::Rng;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;

/// Result of one triggered execution
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    pub status: RunStatus,
    pub duration_ms: i64,
    pub items_processed: Option<i64>,
    pub error_message: Option<String>,
}

impl TriggerOutcome {
    fn failed(duration_ms: i64, message: String) -> Self {
        Self {
            status: RunStatus::Failed,
            duration_ms,
            items_processed: None,
            error_message: Some(message),
        }
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Remote {
        client: reqwest::Client,
        base_url: String,
        secret: Option<String>,
    },
    Simulated {
        delay_ms: Range<u64>,
        items: Range<i64>,
    },
}

/// Fires pipeline executions
#[derive(Debug, Clone)]
pub struct RunTrigger {
    backend: Backend,
}

impl RunTrigger {
    /// Remote when `PIPELINE_API_URL` is configured, simulated otherwise
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        match &config.pipeline_api_url {
            Some(url) => Self::remote(
                url.clone(),
                config.pipeline_api_secret.clone(),
                config.trigger_timeout,
            ),
            None => Ok(Self::simulated()),
        }
    }

    pub fn remote(
        base_url: String,
        secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            backend: Backend::Remote {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                secret,
            },
        })
    }

    /// Sleeps 1.5 to 5 seconds and reports 1,000 to 51,000 processed items
    pub fn simulated() -> Self {
        Self::simulated_with(1_500..5_000, 1_000..51_000)
    }

    pub(crate) fn simulated_with(delay_ms: Range<u64>, items: Range<i64>) -> Self {
        Self {
            backend: Backend::Simulated { delay_ms, items },
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.backend, Backend::Simulated { .. })
    }

    /// Run a pipeline to completion
    pub async fn execute(&self, pipeline_id: Uuid) -> TriggerOutcome {
        match &self.backend {
            Backend::Remote {
                client,
                base_url,
                secret,
            } => execute_remote(client, base_url, secret.as_deref(), pipeline_id).await,
            Backend::Simulated { delay_ms, items } => {
                // Pick both values before sleeping; the rng must not live across the await
                let (delay, items) = {
                    let mut rng = rand::rng();
                    (
                        rng.random_range(delay_ms.clone()),
                        rng.random_range(items.clone()),
                    )
                };

                tracing::debug!("Simulating pipeline {} for {}ms", pipeline_id, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;

                TriggerOutcome {
                    status: RunStatus::Success,
                    duration_ms: delay as i64,
                    items_processed: Some(items),
                    error_message: None,
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionResponse {
    status: Option<String>,
    duration_ms: Option<i64>,
    rows_processed: Option<i64>,
    error_message: Option<String>,
}

async fn execute_remote(
    client: &reqwest::Client,
    base_url: &str,
    secret: Option<&str>,
    pipeline_id: Uuid,
) -> TriggerOutcome {
    let url = format!("{}/pipelines/{}/run", base_url, pipeline_id);
    let started = Instant::now();
    let elapsed_ms = || started.elapsed().as_millis() as i64;

    let mut request = client.post(&url).json(&serde_json::json!({}));
    if let Some(secret) = secret {
        request = request.bearer_auth(secret);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!("Pipeline API request to {} failed: {}", url, err);
            return TriggerOutcome::failed(elapsed_ms(), err.to_string());
        }
    };

    let status = response.status();
    if !status.is_success() {
        let duration_ms = elapsed_ms();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Pipeline API returned {} for {}", status, pipeline_id);
        return TriggerOutcome::failed(
            duration_ms,
            format!("HTTP {}: {}", status.as_u16(), body),
        );
    }

    let measured_ms = elapsed_ms();
    match response.json::<ExecutionResponse>().await {
        Ok(body) => TriggerOutcome {
            status: match body.status.as_deref() {
                Some("success") => RunStatus::Success,
                _ => RunStatus::Failed,
            },
            duration_ms: body.duration_ms.unwrap_or(measured_ms),
            items_processed: body.rows_processed,
            error_message: body.error_message,
        },
        Err(err) => TriggerOutcome::failed(elapsed_ms(), err.to_string()),
    }
}
