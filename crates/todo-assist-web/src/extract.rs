//! JSON body extractor whose rejections use the API error envelope.
//!
//! Use [`AppJson`] in place of `axum::Json` for request bodies: a missing
//! field, a wrong type, or an unparseable body becomes a
//! [`ValidationError`] instead of axum's plain-text rejection.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};

use crate::api::ValidationError;

/// Request body deserialized as JSON.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ValidationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(ValidationError::from(rejection)),
        }
    }
}
