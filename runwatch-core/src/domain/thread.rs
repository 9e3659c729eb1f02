//! Thread domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}
