//! Data Transfer Objects for the agent service
//!
//! Request bodies sent to the service and the paging envelope it wraps
//! list responses in.

pub mod agent;
pub mod message;
pub mod run;

use serde::{Deserialize, Serialize};

/// Envelope for list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub first_id: Option<String>,
    #[serde(default)]
    pub last_id: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Sort order for list endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}
