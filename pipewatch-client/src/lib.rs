//! Pipewatch HTTP Client
//!
//! A typed HTTP client for the Pipewatch server API, used by the CLI and by
//! anything else that wants to read pipeline health or report runs.
//!
//! # Example
//!
//! ```no_run
//! use pipewatch_client::PipewatchClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PipewatchClient::new("http://localhost:8080");
//!
//!     for summary in client.list_pipelines(None).await? {
//!         println!("{}: {:?}", summary.pipeline.name, summary.rollup.success_rate);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod alerts;
mod dashboard;
mod pipelines;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Header carrying the shared secret for mutating endpoints
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the Pipewatch server API
///
/// Methods are grouped by resource:
/// - Pipelines (list with rollups, detail, create, patch, retry)
/// - Runs (start, status)
/// - Alerts (list, raise, acknowledge, resolve)
/// - Dashboard statistics and trends
#[derive(Debug, Clone)]
pub struct PipewatchClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// Sent as `x-api-key` on mutating requests
    api_key: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl PipewatchClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use pipewatch_client::PipewatchClient;
    ///
    /// let client = PipewatchClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            client,
        }
    }

    /// Attach the API key used for mutating requests
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Add the API key header when one is configured
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-success statuses become [`ClientError::ApiError`], carrying the
    /// server's `error` message when the body has one.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_message(body)));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Extract `{"error": "..."}` from an error body, or keep the raw text
fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body)
}
