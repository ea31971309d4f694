pub mod error;
pub mod health;
pub mod queue;
pub mod scores;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{delete, get, post},
};
use serde::Deserialize;

use tally_db::{Database, Store};

pub type AppState<S> = Arc<AppStateInner<S>>;

pub struct AppStateInner<S> {
    pub db: Database<S>,
    /// Wait used by `/receive-block` when the caller gives no timeout.
    pub block_timeout: Duration,
    /// Upper bound on any caller-supplied blocking wait.
    pub max_block_timeout: Duration,
}

impl<S: Store> AppStateInner<S> {
    pub fn new(db: Database<S>) -> Self {
        Self {
            db,
            block_timeout: Duration::from_secs(5),
            max_block_timeout: Duration::from_secs(30),
        }
    }
}

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl LimitQuery {
    pub fn clamped(&self) -> usize {
        self.limit.clamp(1, MAX_LIMIT)
    }
}

/// All routes, bound to `state`. Layers (CORS, tracing) are left to the
/// caller.
pub fn router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        // View tracker
        .route("/view", post(views::record_view::<S>))
        .route("/user/{username}", get(views::get_user::<S>))
        .route("/unique-users", get(views::unique_users::<S>))
        .route("/top-viewers", get(views::top_viewers::<S>))
        // Message queue
        .route("/send", post(queue::send::<S>))
        .route("/receive", get(queue::receive::<S>))
        .route("/receive-block", get(queue::receive_block::<S>))
        .route("/peek", get(queue::peek::<S>))
        .route("/length", get(queue::length::<S>))
        // Score leaderboard
        .route("/score", post(scores::submit_score::<S>))
        .route("/top", get(scores::top::<S>))
        .route("/rank/{username}", get(scores::rank::<S>))
        .route("/remove/{username}", delete(scores::remove::<S>))
        .route("/health", get(health::health::<S>))
        .with_state(state)
}
