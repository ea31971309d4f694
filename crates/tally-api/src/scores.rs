use axum::{
    Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
};
use serde_json::Value;

use tally_db::Store;
use tally_types::api::{RankResponse, RemoveResponse, ScoreResponse, SubmitScoreRequest};
use tally_types::models::RankedEntry;

use crate::error::{AppError, required};
use crate::{AppState, LimitQuery};

/// Accepts JSON numbers and numeric strings. NaN and infinities are
/// rejected since they cannot be ranked meaningfully.
pub fn parse_score(value: Option<Value>) -> Result<f64, AppError> {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    score
        .filter(|s| s.is_finite())
        .ok_or_else(|| AppError::Validation("score must be a number".to_string()))
}

pub async fn submit_score<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<SubmitScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreResponse>, AppError> {
    let Json(req) = payload?;
    let username = required(req.username, "username")?;
    let score = parse_score(req.score)?;

    state.db.submit_score(&username, score).await?;

    Ok(Json(ScoreResponse { username, score }))
}

pub async fn top<S: Store>(
    State(state): State<AppState<S>>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<RankedEntry>>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.db.top_scores(query.clamped()).await?))
}

pub async fn rank<S: Store>(
    State(state): State<AppState<S>>,
    Path(username): Path<String>,
) -> Result<Json<RankResponse>, AppError> {
    let entry = state
        .db
        .rank(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No score for {username}")))?;

    Ok(Json(RankResponse {
        username: entry.username,
        rank: entry.rank,
        score: entry.score,
    }))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Path(username): Path<String>,
) -> Result<Json<RemoveResponse>, AppError> {
    if !state.db.remove_score(&username).await? {
        return Err(AppError::NotFound(format!("No score for {username}")));
    }

    Ok(Json(RemoveResponse {
        username,
        removed: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scores_from_numbers_and_strings() {
        assert_eq!(parse_score(Some(json!(42))).unwrap(), 42.0);
        assert_eq!(parse_score(Some(json!(-1.5))).unwrap(), -1.5);
        assert_eq!(parse_score(Some(json!(" 17 "))).unwrap(), 17.0);
    }

    #[test]
    fn non_numeric_scores_are_rejected() {
        for bad in [None, Some(json!("abc")), Some(json!(null)), Some(json!(true)), Some(json!("inf"))] {
            assert!(matches!(parse_score(bad), Err(AppError::Validation(_))));
        }
    }
}
