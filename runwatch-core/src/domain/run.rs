//! Run domain types
//!
//! A run is one execution of an agent against a thread. The service drives
//! its status; clients observe it and map it onto [`Task`] for polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::task::{Task, TaskStatus};

/// Run record as returned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    #[serde(alias = "agent_id")]
    pub assistant_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage: Option<RunUsage>,
}

/// Run status as spelled on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

/// Error reported by the service for a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// Action the service is waiting on before the run can continue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub submit_tool_outputs: Option<SubmitToolOutputsAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitToolOutputsAction {
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub function: Option<FunctionCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A step taken while executing a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStep {
    pub id: String,
    pub run_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub step_details: Option<serde_json::Value>,
}

impl RunStatus {
    /// Maps a wire status onto the poller's task status
    pub fn task_status(self) -> TaskStatus {
        match self {
            RunStatus::Queued => TaskStatus::Pending,
            RunStatus::InProgress | RunStatus::Cancelling => TaskStatus::Running,
            RunStatus::RequiresAction => TaskStatus::WaitingOnExternalAction,
            RunStatus::Completed => TaskStatus::Succeeded,
            RunStatus::Failed
            | RunStatus::Cancelled
            | RunStatus::Expired
            | RunStatus::Incomplete => TaskStatus::Failed,
        }
    }

    /// Wire spelling of the status, as the service sends it
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl Run {
    /// Converts the run into the task view used by pollers
    ///
    /// A completed run carries itself as the result payload. Runs that end
    /// without a `last_error` (cancelled, expired, incomplete) get a detail
    /// naming the status they stopped in.
    pub fn into_task(self) -> Task {
        let id = self.id.clone();
        match self.status.task_status() {
            TaskStatus::Succeeded => {
                let payload = serde_json::to_value(&self).unwrap_or(serde_json::Value::Null);
                Task::succeeded(id, payload)
            }
            TaskStatus::Failed => {
                let detail = match &self.last_error {
                    Some(err) => err.to_string(),
                    None => format!("run ended with status {}", self.status),
                };
                Task::failed(id, detail)
            }
            status => Task::new(id, status),
        }
    }
}
