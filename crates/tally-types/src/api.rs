use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::QueueMessage;

// Required fields are optional here so handlers can answer 400 with a
// readable message instead of a deserialization rejection.

// -- Views --

#[derive(Debug, Default, Deserialize)]
pub struct RecordViewRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewRecordedResponse {
    pub username: String,
    pub views: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UniqueUsersResponse {
    pub users: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopViewerEntry {
    pub rank: u64,
    pub username: String,
    pub views: i64,
}

// -- Queue --

#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    pub user: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueuedResponse {
    pub status: String,
    pub id: Uuid,
    pub length: u64,
}

/// Result of a dequeue. `Empty` and `Timeout` are the sentinels for the
/// non-blocking and blocking variants respectively.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReceiveResponse {
    Ok { message: QueueMessage },
    Empty,
    Timeout,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LengthResponse {
    pub length: u64,
}

// -- Leaderboard --

/// `score` is kept as a raw JSON value: numbers and numeric strings are
/// both accepted.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitScoreRequest {
    pub username: Option<String>,
    pub score: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub username: String,
    pub score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RankResponse {
    pub username: String,
    pub rank: u64,
    pub score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub username: String,
    pub removed: bool,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
