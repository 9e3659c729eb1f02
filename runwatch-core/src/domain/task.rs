//! Task domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of remote work as observed by a poller
///
/// Only the remote service mutates a task; pollers read it.
/// `result` is present only when `Succeeded`, `error` only when `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// Remote task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Running,
    WaitingOnExternalAction,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Returns true for states from which no further transition occurs
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::WaitingOnExternalAction => "waiting on external action",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl Task {
    /// Creates a task in a non-terminal state
    pub fn new(id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            status,
            result: None,
            error: None,
        }
    }

    /// Creates a succeeded task carrying its result payload
    pub fn succeeded(id: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Succeeded,
            result: Some(result),
            error: None,
        }
    }

    /// Creates a failed task carrying the remote error detail
    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Failed,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
