use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ApiError;

/// JSON extractor whose rejections are `400 { "error": ... }` instead of
/// axum's plain-text bodies. Wrong field types (e.g. a numeric `answer`) land
/// here.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = format!("Invalid request: {}", rejection.body_text());
                tracing::warn!("{}", message);
                Err(ApiError::bad_request(message).into_response())
            }
        }
    }
}
