//! Run DTOs

use serde::{Deserialize, Serialize};

/// Request to start a run of an agent on a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRun {
    pub assistant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Outputs for the tool calls a run is waiting on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    pub tool_outputs: Vec<ToolOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}
