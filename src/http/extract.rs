//! Request body extraction

use super::AppError;
use crate::GatewayError;
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

/// JSON body whose rejections (bad syntax, unknown field, wrong type, wrong
/// content type) become `validation_failed` errors
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request(
        req: Request,
        state: &S,
    ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>> + Send {
        let extracted = Json::<T>::from_request(req, state);

        async move {
            match extracted.await {
                Ok(Json(value)) => Ok(Payload(value)),
                Err(rejection) => {
                    tracing::debug!(status = %rejection.status(), "Rejected request body");
                    Err(AppError::from(GatewayError::validation(rejection.body_text())))
                }
            }
        }
    }
}
