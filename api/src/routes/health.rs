//! Liveness and storage reachability.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{instrument, warn};
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    status: &'static str,

    /// `connected` or `disconnected`.
    database: &'static str,

    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

/// Service health
///
/// Reports whether the record store is reachable. Does not require a role.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "The service and its store are reachable", body = HealthResponse),
        (status = 503, description = "The record store is unreachable", body = HealthResponse),
    )
)]
#[instrument(skip(store))]
#[axum::debug_handler]
pub async fn health(
    State(AppState { store, .. }): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let (status, response) = match store.ping().await {
        Ok(()) => (StatusCode::OK, ("healthy", "connected")),
        Err(error) => {
            warn!(?error, "record store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, ("unhealthy", "disconnected"))
        }
    };

    (
        status,
        Json(HealthResponse {
            status: response.0,
            database: response.1,
            timestamp: OffsetDateTime::now_utc(),
        }),
    )
}
