//! Message DTOs

use serde::{Deserialize, Serialize};

use crate::domain::message::MessageRole;

/// Request to post a message to a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessage {
    pub role: MessageRole,
    pub content: String,
}

impl CreateMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}
