use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use tally_db::Store;
use tally_types::api::HealthResponse;

use crate::AppState;

pub async fn health<S: Store>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                }),
            )
        }
    }
}
