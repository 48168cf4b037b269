//! Partial updates of a patient record.

use axum::{
    Json,
    extract::{Path, State},
};
use db::{Patient, PatientId, PatientUpdate};
use tracing::instrument;

use crate::{
    AppState,
    auth::{Caller, Capability},
    error::{ErrorResponse, Result},
    extract::JsonBody,
};

/// Update a patient
///
/// Only the given fields change. Setting `status` to `discharged` without a
/// `discharge_date` discharges the patient today. Touching `status` or `discharge_date`
/// also requires the discharge capability.
#[utoipa::path(
    put,
    path = "/api/patients/{id}",
    params(
        ("id" = i64, Path, description = "The patient identifier"),
    ),
    request_body = PatientUpdate,
    responses(
        (status = 200, description = "Returns the updated record", body = Patient),
        (status = 400, description = "The update is empty or invalid", body = ErrorResponse),
        (status = 403, description = "The role may not make this change", body = ErrorResponse),
        (status = 404, description = "The patient does not exist", body = ErrorResponse),
    )
)]
#[instrument(skip(store, body))]
#[axum::debug_handler]
pub async fn update_patient(
    State(AppState { store, .. }): State<AppState>,
    caller: Caller,
    Path(id): Path<PatientId>,
    JsonBody(body): JsonBody<PatientUpdate>,
) -> Result<Json<Patient>> {
    caller.require(Capability::EditPatient)?;
    if body.status.is_some() || body.discharge_date.is_some() {
        caller.require(Capability::DischargePatient)?;
    }

    Ok(Json(store.update(id, &body).await?))
}
