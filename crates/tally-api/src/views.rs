use axum::{
    Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
};
use tracing::info;

use tally_db::Store;
use tally_types::api::{
    RecordViewRequest, TopViewerEntry, UniqueUsersResponse, ViewRecordedResponse,
};
use tally_types::models::UserProfile;

use crate::error::{AppError, required};
use crate::{AppState, LimitQuery};

pub async fn record_view<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<RecordViewRequest>, JsonRejection>,
) -> Result<Json<ViewRecordedResponse>, AppError> {
    let Json(req) = payload?;
    let username = required(req.username, "username")?;

    let views = state
        .db
        .record_view(&username, req.name.as_deref(), req.email.as_deref())
        .await?;

    Ok(Json(ViewRecordedResponse { username, views }))
}

pub async fn get_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.db.get_user(&username).await?))
}

pub async fn unique_users<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<UniqueUsersResponse>, AppError> {
    let users = state.db.unique_users().await?;
    Ok(Json(UniqueUsersResponse {
        count: users.len(),
        users,
    }))
}

pub async fn top_viewers<S: Store>(
    State(state): State<AppState<S>>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<TopViewerEntry>>, AppError> {
    let Query(query) = query?;
    let limit = query.clamped();
    let top = state.db.top_viewers(limit).await?;
    info!("Top viewers requested (limit {}, {} returned)", limit, top.len());

    Ok(Json(
        top.into_iter()
            .map(|entry| TopViewerEntry {
                rank: entry.rank,
                username: entry.username,
                views: entry.score as i64,
            })
            .collect(),
    ))
}
