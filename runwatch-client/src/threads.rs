//! Thread and message API endpoints

use reqwest::Method;
use runwatch_core::domain::agent::DeletionStatus;
use runwatch_core::domain::message::Message;
use runwatch_core::domain::thread::Thread;
use runwatch_core::dto::message::CreateMessage;
use runwatch_core::dto::SortOrder;

use crate::AgentsClient;
use crate::error::Result;

impl AgentsClient {
    // =============================================================================
    // Threads
    // =============================================================================

    /// Create an empty conversation thread
    pub async fn create_thread(&self) -> Result<Thread> {
        let response = self
            .request(Method::POST, "/threads")
            .json(&serde_json::json!({}))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a thread along with its messages and runs
    pub async fn delete_thread(&self, thread_id: &str) -> Result<DeletionStatus> {
        let path = format!("/threads/{}", thread_id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Messages
    // =============================================================================

    /// Post a message to a thread
    pub async fn create_message(&self, thread_id: &str, req: CreateMessage) -> Result<Message> {
        let path = format!("/threads/{}/messages", thread_id);
        let response = self
            .request(Method::POST, &path)
            .json(&req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List every message of a thread, following pagination
    ///
    /// # Arguments
    /// * `thread_id` - The thread to read
    /// * `order` - Creation-time order of the returned messages
    pub async fn list_messages(&self, thread_id: &str, order: SortOrder) -> Result<Vec<Message>> {
        let path = format!("/threads/{}/messages", thread_id);
        self.list_all(&path, &[("order", order.as_str())]).await
    }
}
