//! Aggregated views over all patient records.

use axum::{Json, extract::State};
use db::{
    PatientFilter,
    dashboard::{self, Dashboard},
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::{Caller, Capability},
    error::{ErrorResponse, Result},
};

/// Get the dashboard
///
/// Status counts, the weekly admission trend, condition frequencies and recent activity,
/// computed from the records at the time of the request.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "The current dashboard", body = Dashboard),
        (status = 403, description = "The role may not view records", body = ErrorResponse),
    )
)]
#[instrument(skip(store, config))]
#[axum::debug_handler]
pub async fn get_dashboard(
    State(AppState { store, config }): State<AppState>,
    caller: Caller,
) -> Result<Json<Dashboard>> {
    caller.require(Capability::ViewRecords)?;

    let dashboard = dashboard::build(&*store, &config.dashboard.options()).await?;
    Ok(Json(dashboard))
}

/// Headline patient counts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatsResponse {
    total_patients: u64,
    admitted: u64,
    discharged: u64,
    /// Patients whose admission date is today.
    today_admissions: u64,
    #[serde(with = "time::serde::rfc3339")]
    last_updated: OffsetDateTime,
}

/// Get patient statistics
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Current patient counts", body = StatsResponse),
        (status = 403, description = "The role may not view records", body = ErrorResponse),
    )
)]
#[instrument(skip(store))]
#[axum::debug_handler]
pub async fn get_stats(
    State(AppState { store, .. }): State<AppState>,
    caller: Caller,
) -> Result<Json<StatsResponse>> {
    caller.require(Capability::ViewRecords)?;

    let patients = store.list(&PatientFilter::default()).await?;
    let counts = dashboard::count_statuses(&patients, db::today());

    Ok(Json(StatsResponse {
        total_patients: counts.total,
        admitted: counts.admitted,
        discharged: counts.discharged,
        today_admissions: counts.admitted_today,
        last_updated: OffsetDateTime::now_utc(),
    }))
}
