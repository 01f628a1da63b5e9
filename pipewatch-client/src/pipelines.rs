//! Pipeline-related API endpoints

use crate::PipewatchClient;
use crate::error::Result;
use pipewatch_core::domain::pipeline::PipelineStatus;
use pipewatch_core::dto::pipeline::{
    CreatePipeline, PipelineCreated, PipelineDetail, PipelineSummary, PipelineUpdated,
    UpdatePipeline,
};
use pipewatch_core::dto::run::RunStarted;
use uuid::Uuid;

impl PipewatchClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// List pipelines with their health rollup, optionally by status
    pub async fn list_pipelines(
        &self,
        status: Option<PipelineStatus>,
    ) -> Result<Vec<PipelineSummary>> {
        let mut request = self.client.get(self.url("/api/pipelines"));
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Get a pipeline with its recent runs and alerts
    pub async fn get_pipeline(&self, pipeline_id: Uuid) -> Result<PipelineDetail> {
        let url = self.url(&format!("/api/pipelines/{}", pipeline_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Register a new pipeline
    ///
    /// # Example
    /// ```no_run
    /// # use pipewatch_client::PipewatchClient;
    /// # use pipewatch_core::dto::pipeline::CreatePipeline;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = PipewatchClient::new("http://localhost:8080").with_api_key("secret");
    /// let created = client.create_pipeline(CreatePipeline {
    ///     name: "orders_sync".to_string(),
    ///     source: Some("Postgres".to_string()),
    ///     ..CreatePipeline::default()
    /// }).await?;
    /// println!("{}", created.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_pipeline(&self, req: CreatePipeline) -> Result<PipelineCreated> {
        let request = self.client.post(self.url("/api/jobs")).json(&req);
        let response = self.authorized(request).send().await?;

        self.handle_response(response).await
    }

    /// Apply a partial update; untouched fields are left as they are
    pub async fn update_pipeline(
        &self,
        pipeline_id: Uuid,
        patch: &UpdatePipeline,
    ) -> Result<PipelineUpdated> {
        let url = self.url(&format!("/api/jobs/{}", pipeline_id));
        let request = self.client.patch(&url).json(patch);
        let response = self.authorized(request).send().await?;

        self.handle_response(response).await
    }

    /// Start a new run that the server executes in the background
    pub async fn retry_pipeline(&self, pipeline_id: Uuid) -> Result<RunStarted> {
        let url = self.url(&format!("/api/pipelines/{}/retry", pipeline_id));
        let response = self.authorized(self.client.post(&url)).send().await?;

        self.handle_response(response).await
    }
}
