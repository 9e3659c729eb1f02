//! Task service seam
//!
//! The poller depends only on [`StatusSource`]. [`TaskService`] adds the
//! submission and cleanup calls a caller drives around it. Both are
//! implemented by [`AgentsClient`] over agent runs, and by in-memory fakes
//! in tests.

use async_trait::async_trait;
use runwatch_core::domain::task::Task;
use runwatch_core::dto::run::CreateRun;
use std::fmt;
use tracing::debug;

use crate::AgentsClient;
use crate::error::Result;

/// Read-only access to the status of submitted tasks
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Opaque handle correlating a submission with its remote status
    type Handle: fmt::Display + Send + Sync;

    /// Fetches the current state of a task
    async fn get_status(&self, handle: &Self::Handle) -> Result<Task>;
}

/// Full task lifecycle: submit, observe, clean up
///
/// `delete` is never called by the poller; the caller invokes it once it
/// has consumed the result.
#[async_trait]
pub trait TaskService: StatusSource {
    /// Description of the work to submit
    type Spec: Send;

    /// Submits a task and returns its handle
    async fn submit(&self, spec: Self::Spec) -> Result<Self::Handle>;

    /// Removes a task and whatever the service keeps for it
    async fn delete(&self, handle: &Self::Handle) -> Result<()>;
}

/// Handle of an agent run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunHandle {
    pub thread_id: String,
    pub run_id: String,
}

impl RunHandle {
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
        }
    }
}

impl fmt::Display for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.thread_id, self.run_id)
    }
}

/// Run submission: which agent to run on which thread
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub thread_id: String,
    pub agent_id: String,
    /// Overrides the agent's instructions for this run only
    pub instructions: Option<String>,
}

impl RunSpec {
    pub fn new(thread_id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            agent_id: agent_id.into(),
            instructions: None,
        }
    }
}

#[async_trait]
impl StatusSource for AgentsClient {
    type Handle = RunHandle;

    async fn get_status(&self, handle: &RunHandle) -> Result<Task> {
        let run = self.get_run(&handle.thread_id, &handle.run_id).await?;
        debug!("Run {} reported status {:?}", handle, run.status);
        Ok(run.into_task())
    }
}

#[async_trait]
impl TaskService for AgentsClient {
    type Spec = RunSpec;

    async fn submit(&self, spec: RunSpec) -> Result<RunHandle> {
        let run = self
            .create_run(
                &spec.thread_id,
                CreateRun {
                    assistant_id: spec.agent_id,
                    instructions: spec.instructions,
                },
            )
            .await?;

        debug!("Submitted run {} on thread {}", run.id, run.thread_id);
        Ok(RunHandle::new(run.thread_id, run.id))
    }

    /// Runs cannot be deleted on their own; the thread holding them is.
    async fn delete(&self, handle: &RunHandle) -> Result<()> {
        self.delete_thread(&handle.thread_id).await?;
        debug!("Deleted thread {}", handle.thread_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use runwatch_core::domain::task::TaskStatus;
    use serde_json::json;

    #[test]
    fn test_run_handle_display() {
        let handle = RunHandle::new("thread_1", "run_1");
        assert_eq!(handle.to_string(), "thread_1/run_1");
    }

    #[tokio::test]
    async fn test_submit_returns_handle_from_created_run() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/threads/thread_1/runs")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({
                "assistant_id": "asst_1",
                "instructions": "Answer briefly"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "id": "run_7",
                    "thread_id": "thread_1",
                    "assistant_id": "asst_1",
                    "status": "queued",
                    "created_at": 1_700_000_000
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = AgentsClient::new(server.url());
        let mut spec = RunSpec::new("thread_1", "asst_1");
        spec.instructions = Some("Answer briefly".to_string());

        let handle = client.submit(spec).await.unwrap();
        assert_eq!(handle, RunHandle::new("thread_1", "run_7"));
    }

    #[tokio::test]
    async fn test_get_status_maps_failed_run() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/threads/thread_1/runs/run_1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "id": "run_1",
                    "thread_id": "thread_1",
                    "assistant_id": "asst_1",
                    "status": "failed",
                    "created_at": 1_700_000_000,
                    "failed_at": 1_700_000_010,
                    "last_error": { "code": "server_error", "message": "Sorry, something went wrong." }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = AgentsClient::new(server.url());
        let task = client
            .get_status(&RunHandle::new("thread_1", "run_1"))
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(
            task.error.as_deref(),
            Some("server_error: Sorry, something went wrong.")
        );
    }

    #[tokio::test]
    async fn test_delete_removes_thread() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/threads/thread_1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"id":"thread_1","object":"thread.deleted","deleted":true}"#)
            .create_async()
            .await;

        let client = AgentsClient::new(server.url());
        client
            .delete(&RunHandle::new("thread_1", "run_1"))
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
