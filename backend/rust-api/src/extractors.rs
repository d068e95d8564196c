use axum::{
    extract::{FromRequest, Request},
    Json,
};

use crate::errors::ApiError;

/// JSON extractor whose rejection is an `ApiError`, so a malformed body
/// renders the same `{ "message", "status" }` shape as every other error.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                tracing::warn!("Rejected request body: {}", rejection);
                Err(ApiError::bad_request(format!(
                    "Failed to parse JSON request body: {}",
                    rejection
                )))
            }
        }
    }
}
