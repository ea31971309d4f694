//! Key layout. Per-entity keys follow `entity:identifier`.

/// Set of every username that has recorded a view.
pub const UNIQUE_USERS: &str = "unique_users";

/// Sorted set of username -> view count.
pub const VIEW_LEADERBOARD: &str = "leaderboard:views";

/// Sorted set of username -> submitted score.
pub const SCORE_LEADERBOARD: &str = "leaderboard:scores";

/// List of JSON-encoded queue messages, oldest at the head.
pub const QUEUE: &str = "queue:messages";

pub fn views(username: &str) -> String {
    format!("views:{username}")
}

pub fn user(username: &str) -> String {
    format!("user:{username}")
}
