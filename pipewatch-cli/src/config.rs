//! Configuration module
//!
//! Connection settings shared by every command.

use pipewatch_client::PipewatchClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Pipewatch server
    pub server_url: String,
    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,
}

impl Config {
    pub fn client(&self) -> PipewatchClient {
        let client = PipewatchClient::new(&self.server_url);
        match &self.api_key {
            Some(key) => client.with_api_key(key),
            None => client,
        }
    }
}
