use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::metrics::track_ledger_operation;
use crate::models::CalendarDate;
use crate::services::AppState;

/// Top scores for today (UTC), highest first.
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let today = CalendarDate::today();
    let rows = track_ledger_operation(
        "top_scores",
        state.ledger.top_scores(today, state.config.leaderboard_limit),
    )
    .await
    .map_err(ApiError::database)?;

    Ok(Json(rows))
}

pub async fn get_user_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = track_ledger_operation("user_stats", state.ledger.user_stats(&user_id))
        .await
        .map_err(ApiError::database)?;

    Ok(Json(stats))
}
