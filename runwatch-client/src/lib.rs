//! Runwatch HTTP Client
//!
//! A type-safe client for an OpenAI-assistants-compatible agent service,
//! plus the run poller that waits for submitted runs to finish.
//!
//! # Example
//!
//! ```no_run
//! use runwatch_client::{AgentsClient, PollConfig, RunSpec, TaskService, await_completion};
//! use runwatch_core::dto::agent::CreateAgent;
//! use runwatch_core::dto::message::CreateMessage;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = AgentsClient::new("https://example.services.ai.azure.com/api/projects/demo")
//!         .with_bearer_token("token");
//!
//!     let agent = client.create_agent(CreateAgent::new("gpt-4o")).await?;
//!     let thread = client.create_thread().await?;
//!     client
//!         .create_message(&thread.id, CreateMessage::user("Hello, tell me a joke"))
//!         .await?;
//!
//!     let handle = client.submit(RunSpec::new(&thread.id, &agent.id)).await?;
//!     let config = PollConfig::new(Duration::from_secs(1), Some(Duration::from_secs(300)));
//!     let result = await_completion(&client, &handle, &config).await?;
//!     println!("Run finished after {} polls", result.polls);
//!
//!     client.delete(&handle).await?;
//!     client.delete_agent(&agent.id).await?;
//!     Ok(())
//! }
//! ```

mod agents;
pub mod error;
pub mod poller;
mod runs;
pub mod service;
mod threads;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use poller::{PollConfig, PollError, RunPoller, Sleeper, TaskResult, TokioSleeper, await_completion};
pub use service::{RunHandle, RunSpec, StatusSource, TaskService};

use reqwest::{Client, Method, RequestBuilder};
use runwatch_core::dto::ListPage;
use serde::de::DeserializeOwned;

/// Default value of the `api-version` query parameter
pub const DEFAULT_API_VERSION: &str = "v1";

/// HTTP client for the agent service API
///
/// Methods are organized into logical groups:
/// - Agent management (create, get, list, delete)
/// - Threads and messages
/// - Run lifecycle (create, get, cancel, tool outputs, steps)
#[derive(Debug, Clone)]
pub struct AgentsClient {
    /// Base URL of the project endpoint
    base_url: String,
    /// Value sent as the `api-version` query parameter
    api_version: String,
    /// Bearer token attached to every request, if any
    token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl AgentsClient {
    /// Create a new agent service client
    ///
    /// # Arguments
    /// * `base_url` - The project endpoint (e.g., "https://host/api/projects/demo")
    ///
    /// # Example
    /// ```
    /// use runwatch_client::AgentsClient;
    ///
    /// let client = AgentsClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use runwatch_client::AgentsClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = AgentsClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
            client,
        }
    }

    /// Override the `api-version` query parameter
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Attach a bearer token to every request
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the API version sent with each request
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Start a request against `path`, relative to the base URL
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self
            .client
            .request(method, url)
            .query(&[("api-version", self.api_version.as_str())]);

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Collect every page of a list endpoint
    ///
    /// Follows `has_more` by sending the previous page's `last_id` as the
    /// `after` cursor until the service reports no further pages.
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut builder = self.request(Method::GET, path);
            if !query.is_empty() {
                builder = builder.query(query);
            }
            if let Some(cursor) = &after {
                builder = builder.query(&[("after", cursor.as_str())]);
            }

            let response = builder.send().await?;
            let page: ListPage<T> = self.handle_response(response).await?;
            items.extend(page.data);

            match page.last_id {
                Some(last_id) if page.has_more => {
                    if after.as_deref() == Some(last_id.as_str()) {
                        return Err(ClientError::ParseError(format!(
                            "List {} did not advance past cursor {}",
                            path, last_id
                        )));
                    }
                    after = Some(last_id);
                }
                _ => return Ok(items),
            }
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
