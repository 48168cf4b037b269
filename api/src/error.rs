use std::{borrow::Cow, sync::Arc};

use axum::{
    Json,
    extract::{Request, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::{Capability, Role};

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// JSON error response structure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,

    /// Every violated constraint, for validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// The central error type used for HTTP responses.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(Cow<'static, str>),

    #[error(transparent)]
    Validation(#[from] db::ValidationError),

    #[error("missing role, set the `{}` header", crate::auth::ROLE_HEADER)]
    Unauthorized,

    #[error("role '{0}' may not {1}")]
    Forbidden(Role, Capability),

    #[error("internal error")]
    Internal(
        #[source]
        #[from]
        eyre::Report,
    ),

    /// Storage failure
    #[error("database error")]
    Database(#[source] db::Error),
}

impl From<db::Error> for AppError {
    fn from(err: db::Error) -> Self {
        match err {
            db::Error::Validation(err) => AppError::Validation(err),
            db::Error::NotFound(id) => AppError::NotFound(format!("patient {id} not found")),
            err => AppError::Database(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("invalid request body: {}", rejection.body_text()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Internal(..) | AppError::Database(..) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
                Vec::new(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), Vec::new()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string(), Vec::new()),
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "invalid patient record".to_string(),
                err.violations().iter().map(ToString::to_string).collect(),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), Vec::new()),
            AppError::Forbidden(..) => (StatusCode::FORBIDDEN, self.to_string(), Vec::new()),
        };

        let mut response = (status, Json(ErrorResponse { error, details })).into_response();

        response.extensions_mut().insert(Arc::new(self));

        response
    }
}

/// Logs server-side failures that were turned into a response.
///
/// Must be layered after route registration, so it wraps every handler.
pub async fn log_app_error(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if let Some(err) = response.extensions().get::<Arc<AppError>>() {
        match &**err {
            AppError::Internal(report) => error!(error = ?report, "internal server error"),
            AppError::Database(err) => error!(error = ?err, "database error"),
            _ => {}
        }
    }

    response
}
