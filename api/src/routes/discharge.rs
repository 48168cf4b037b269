//! The discharge transition.

use axum::{
    Json,
    extract::{Path, State},
};
use db::{Patient, PatientId, ValidationError, validation::parse_date};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::{Caller, Capability},
    error::{ErrorResponse, Result},
    extract::JsonBody,
};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DischargeRequest {
    /// `YYYY-MM-DD`, defaults to today.
    discharge_date: Option<String>,
}

/// Discharge a patient
///
/// Fails with `400` when the patient is already discharged or the date precedes admission.
#[utoipa::path(
    post,
    path = "/api/patients/{id}/discharge",
    params(
        ("id" = i64, Path, description = "The patient identifier"),
    ),
    request_body = DischargeRequest,
    responses(
        (status = 200, description = "Returns the discharged record", body = Patient),
        (status = 400, description = "The patient cannot be discharged", body = ErrorResponse),
        (status = 404, description = "The patient does not exist", body = ErrorResponse),
    )
)]
#[instrument(skip(store))]
#[axum::debug_handler]
pub async fn discharge_patient(
    State(AppState { store, .. }): State<AppState>,
    caller: Caller,
    Path(id): Path<PatientId>,
    body: Option<JsonBody<DischargeRequest>>,
) -> Result<Json<Patient>> {
    caller.require(Capability::DischargePatient)?;

    let request = body.map(|JsonBody(request)| request).unwrap_or_default();
    let date = request
        .discharge_date
        .as_deref()
        .map(|value| parse_date("discharge_date", value))
        .transpose()
        .map_err(ValidationError::from)?;

    Ok(Json(store.discharge(id, date).await?))
}
