//! Message domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message posted to a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single content block of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    ImageFile { image_file: ImageFile },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFile {
    pub file_id: String,
}

impl Message {
    /// Text of the last text block, if any
    pub fn last_text(&self) -> Option<&str> {
        self.content.iter().rev().find_map(|block| match block {
            MessageContent::Text { text } => Some(text.value.as_str()),
            _ => None,
        })
    }

    /// File IDs of every image block
    pub fn image_file_ids(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|block| match block {
                MessageContent::ImageFile { image_file } => Some(image_file.file_id.as_str()),
                _ => None,
            })
            .collect()
    }
}
