//! Run-related API endpoints

use crate::PipewatchClient;
use crate::error::Result;
use pipewatch_core::dto::run::{RunStarted, RunStatusView, StartRun};
use uuid::Uuid;

impl PipewatchClient {
    /// Open a running run; the caller reports completion through the webhook
    pub async fn start_run(&self, pipeline_id: Uuid) -> Result<RunStarted> {
        let req = StartRun {
            job_id: Some(pipeline_id),
        };
        let request = self.client.post(self.url("/api/runs")).json(&req);
        let response = self.authorized(request).send().await?;

        self.handle_response(response).await
    }

    pub async fn get_run(&self, run_id: Uuid) -> Result<RunStatusView> {
        let url = self.url(&format!("/api/runs/{}", run_id));
        tracing::debug!("Fetching run status from {}", url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
