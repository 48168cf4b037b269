//! Request body extraction that rejects in the API's error format.

use axum::{
    Json,
    extract::{FromRequest, OptionalFromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A JSON request body.
///
/// Same as [`axum::Json`], except that a body which cannot be decoded is answered with a `400`
/// [`ErrorResponse`](crate::error::ErrorResponse) instead of a plain-text rejection.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl<T, S> OptionalFromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, AppError> {
        let body = <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(body.map(|Json(value)| JsonBody(value)))
    }
}
