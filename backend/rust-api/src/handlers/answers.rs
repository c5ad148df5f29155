use axum::{extract::State, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::middlewares::auth::{ensure_same_user, IdentityClaims};
use crate::models::answer::{ValidateRequest, ValidateResponse};
use crate::models::CalendarDate;
use crate::services::{answer_service::AnswerService, AppState};

pub async fn validate_answer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<IdentityClaims>,
    AppJson(req): AppJson<ValidateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = req.into_submission(CalendarDate::today()).map_err(|msg| {
        tracing::warn!("Rejected answer submission: {}", msg);
        ApiError::bad_request(msg)
    })?;

    ensure_same_user(&claims, &submission.user_id)?;

    let service = AnswerService::new(state.ledger.clone());
    let verdict = service
        .submit_answer(&submission)
        .await
        .map_err(ApiError::database)?;

    Ok(Json(ValidateResponse::from(verdict)))
}
