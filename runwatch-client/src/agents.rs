//! Agent-related API endpoints

use reqwest::Method;
use runwatch_core::domain::agent::{Agent, DeletionStatus};
use runwatch_core::dto::agent::CreateAgent;

use crate::AgentsClient;
use crate::error::Result;

impl AgentsClient {
    // =============================================================================
    // Agent Management
    // =============================================================================

    /// Create a new agent
    ///
    /// # Example
    /// ```no_run
    /// # use runwatch_client::AgentsClient;
    /// # use runwatch_core::dto::agent::CreateAgent;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = AgentsClient::new("http://localhost:8080");
    /// let agent = client
    ///     .create_agent(CreateAgent::new("gpt-4o").with_name("my-agent"))
    ///     .await?;
    /// println!("Created agent, agent ID: {}", agent.id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_agent(&self, req: CreateAgent) -> Result<Agent> {
        let response = self
            .request(Method::POST, "/assistants")
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get an agent by ID
    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        let path = format!("/assistants/{}", agent_id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// List all agents, following pagination
    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.list_all("/assistants", &[]).await
    }

    /// Delete an agent
    pub async fn delete_agent(&self, agent_id: &str) -> Result<DeletionStatus> {
        let path = format!("/assistants/{}", agent_id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_response(response).await
    }
}
