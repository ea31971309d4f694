use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A queued message as stored (JSON-encoded) in the message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub id: Uuid,
    pub user: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl QueueMessage {
    pub fn new(user: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: user.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Metadata and view count for a tracked user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub views: i64,
}

/// One row of a descending ranking. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: u64,
    pub username: String,
    pub score: f64,
}
