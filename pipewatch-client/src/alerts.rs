//! Alert-related API endpoints

use crate::PipewatchClient;
use crate::error::Result;
use pipewatch_core::domain::alert::{Alert, AlertStatus};
use pipewatch_core::dto::alert::{AlertQuery, AlertStatusChanged, CreateAlert, UpdateAlertStatus};
use uuid::Uuid;

impl PipewatchClient {
    /// List alerts, newest first
    pub async fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>> {
        let response = self
            .client
            .get(self.url("/api/alerts"))
            .query(query)
            .send()
            .await?;

        self.handle_response(response).await
    }

    pub async fn create_alert(&self, req: CreateAlert) -> Result<Alert> {
        let request = self.client.post(self.url("/api/alerts")).json(&req);
        let response = self.authorized(request).send().await?;

        self.handle_response(response).await
    }

    /// Move an alert to `status`
    pub async fn update_alert_status(
        &self,
        alert_id: Uuid,
        status: AlertStatus,
    ) -> Result<AlertStatusChanged> {
        let url = self.url(&format!("/api/alerts/{}", alert_id));
        let req = UpdateAlertStatus {
            status: Some(status),
        };
        let request = self.client.patch(&url).json(&req);
        let response = self.authorized(request).send().await?;

        self.handle_response(response).await
    }
}
