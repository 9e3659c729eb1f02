//! Configuration module
//!
//! Connection settings shared by every command.

use std::time::Duration;

use anyhow::Context;
use runwatch_client::AgentsClient;

/// Default limit for a single HTTP request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Project endpoint of the agent service
    pub endpoint: String,

    /// Bearer token, if the service requires one
    pub token: Option<String>,

    /// Value of the api-version query parameter
    pub api_version: String,

    /// Upper bound for each HTTP request, including status queries
    pub request_timeout: Duration,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.endpoint.is_empty() {
            anyhow::bail!("endpoint cannot be empty");
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            anyhow::bail!("endpoint must start with http:// or https://");
        }

        if self.api_version.is_empty() {
            anyhow::bail!("api_version cannot be empty");
        }

        if self.token.as_deref().is_some_and(str::is_empty) {
            anyhow::bail!("token cannot be empty when set");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than zero");
        }

        Ok(())
    }

    /// Builds the client every command talks through
    ///
    /// Every request is bounded by `request_timeout`, so a hung status
    /// query surfaces as an error instead of blocking forever.
    pub fn client(&self) -> anyhow::Result<AgentsClient> {
        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let client =
            AgentsClient::with_client(&self.endpoint, http).with_api_version(&self.api_version);
        Ok(match &self.token {
            Some(token) => client.with_bearer_token(token),
            None => client,
        })
    }
}
