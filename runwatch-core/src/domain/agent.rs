//! Agent domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An agent definition hosted by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: Option<String>,
    pub model: String,
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<serde_json::Value>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// The `type` of each configured tool, in order
    pub fn tool_types(&self) -> impl Iterator<Item = &str> {
        self.tools
            .iter()
            .filter_map(|tool| tool.get("type").and_then(serde_json::Value::as_str))
    }
}

/// Acknowledgement returned by delete endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionStatus {
    pub id: String,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_types() {
        let agent: Agent = serde_json::from_value(serde_json::json!({
            "id": "asst_1",
            "model": "gpt-4o",
            "created_at": 1_700_000_000,
            "tools": [{ "type": "code_interpreter" }, { "type": "file_search" }]
        }))
        .unwrap();
        assert_eq!(
            agent.tool_types().collect::<Vec<_>>(),
            ["code_interpreter", "file_search"]
        );

        let bare: Agent = serde_json::from_value(serde_json::json!({
            "id": "asst_2",
            "model": "gpt-4o",
            "created_at": 1_700_000_000
        }))
        .unwrap();
        assert_eq!(bare.tool_types().count(), 0);
    }
}
