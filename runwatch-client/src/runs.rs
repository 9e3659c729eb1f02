//! Run-related API endpoints

use reqwest::Method;
use runwatch_core::domain::run::{Run, RunStep};
use runwatch_core::dto::run::{CreateRun, SubmitToolOutputs, ToolOutput};

use crate::AgentsClient;
use crate::error::{ClientError, Result};

impl AgentsClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Start a run of an agent on a thread
    ///
    /// The returned run is usually still `queued`; poll it with
    /// [`crate::await_completion`] or [`AgentsClient::get_run`].
    pub async fn create_run(&self, thread_id: &str, req: CreateRun) -> Result<Run> {
        let path = format!("/threads/{}/runs", thread_id);
        let response = self
            .request(Method::POST, &path)
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the current state of a run
    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let path = format!("/threads/{}/runs/{}", thread_id, run_id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Ask the service to cancel a run
    ///
    /// The run moves to `cancelling` and later to `cancelled`.
    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let path = format!("/threads/{}/runs/{}/cancel", thread_id, run_id);
        let response = self.request(Method::POST, &path).send().await?;

        self.handle_response(response).await
    }

    /// Answer the tool calls a `requires_action` run is waiting on
    pub async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        tool_outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        if tool_outputs.is_empty() {
            return Err(ClientError::InvalidRequest(
                "at least one tool output is required".to_string(),
            ));
        }

        let path = format!("/threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id);
        let response = self
            .request(Method::POST, &path)
            .json(&SubmitToolOutputs { tool_outputs })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List every step a run has taken, following pagination
    pub async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> Result<Vec<RunStep>> {
        let path = format!("/threads/{}/runs/{}/steps", thread_id, run_id);
        self.list_all(&path, &[]).await
    }
}
