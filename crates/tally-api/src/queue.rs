use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{debug, info};

use tally_db::Store;
use tally_types::api::{LengthResponse, QueuedResponse, ReceiveResponse, SendMessageRequest};
use tally_types::models::QueueMessage;

use crate::AppState;
use crate::error::{AppError, required};

#[derive(Debug, Deserialize)]
pub struct BlockQuery {
    /// Seconds; fractions allowed.
    pub timeout: Option<f64>,
}

impl BlockQuery {
    /// Requested wait, falling back to `default` for missing or
    /// non-positive values and capped at `max`.
    pub fn resolve(&self, default: Duration, max: Duration) -> Duration {
        match self.timeout {
            Some(secs) if secs.is_finite() && secs > 0.0 => {
                Duration::from_secs_f64(secs.min(max.as_secs_f64()))
            }
            _ => default.min(max),
        }
    }
}

pub async fn send<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QueuedResponse>), AppError> {
    let Json(req) = payload?;
    let user = required(req.user, "user")?;
    let content = required(req.content, "content")?;

    let (message, length) = state.db.enqueue(&user, &content).await?;

    Ok((
        StatusCode::CREATED,
        Json(QueuedResponse {
            status: "queued".to_string(),
            id: message.id,
            length,
        }),
    ))
}

pub async fn receive<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<ReceiveResponse>, AppError> {
    let response = match state.db.dequeue().await? {
        Some(message) => ReceiveResponse::Ok { message },
        None => ReceiveResponse::Empty,
    };
    Ok(Json(response))
}

pub async fn receive_block<S: Store>(
    State(state): State<AppState<S>>,
    query: Result<Query<BlockQuery>, QueryRejection>,
) -> Result<Json<ReceiveResponse>, AppError> {
    let Query(query) = query?;
    let timeout = query.resolve(state.block_timeout, state.max_block_timeout);
    debug!("Waiting up to {:?} for a message", timeout);

    let response = match state.db.dequeue_blocking(timeout).await? {
        Some(message) => ReceiveResponse::Ok { message },
        None => {
            info!("Blocking receive timed out after {:?}", timeout);
            ReceiveResponse::Timeout
        }
    };
    Ok(Json(response))
}

pub async fn peek<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<QueueMessage>>, AppError> {
    Ok(Json(state.db.peek_all().await?))
}

pub async fn length<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<LengthResponse>, AppError> {
    Ok(Json(LengthResponse {
        length: state.db.queue_length().await?,
    }))
}
