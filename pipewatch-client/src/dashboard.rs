//! Dashboard and metrics endpoints

use crate::PipewatchClient;
use crate::error::Result;
use pipewatch_core::health::{DashboardStats, LatencyPoint, VolumePoint};

impl PipewatchClient {
    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let response = self.client.get(self.url("/api/dashboard")).send().await?;
        self.handle_response(response).await
    }

    /// Hourly latency over the last 24 hours, oldest first
    pub async fn latency_trend(&self) -> Result<Vec<LatencyPoint>> {
        let response = self
            .client
            .get(self.url("/api/metrics/latency"))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Daily run outcomes over the last 7 days, oldest first
    pub async fn volume_trend(&self) -> Result<Vec<VolumePoint>> {
        let response = self
            .client
            .get(self.url("/api/metrics/volume"))
            .send()
            .await?;
        self.handle_response(response).await
    }
}
