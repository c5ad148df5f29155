use axum::{extract::State, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::middlewares::auth::{ensure_same_user, IdentityClaims};
use crate::models::sync::{SyncRequest, SyncResponse};
use crate::services::{sync_service::SyncService, AppState};

pub async fn sync_entries(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<IdentityClaims>,
    AppJson(req): AppJson<SyncRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = req.firebase_uid.clone();
    let records = req
        .into_records(state.config.sync.max_batch_entries)
        .map_err(|msg| {
            tracing::warn!("Rejected sync batch: {}", msg);
            ApiError::bad_request(msg)
        })?;

    ensure_same_user(&claims, &user_id)?;

    let synced = SyncService::new(state.ledger.clone())
        .apply_batch(&user_id, &records)
        .await
        .map_err(ApiError::database)?;

    Ok(Json(SyncResponse {
        success: true,
        synced,
    }))
}
