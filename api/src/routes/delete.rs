//! Permanent removal of a patient record.

use axum::{
    Json,
    extract::{Path, State},
};
use db::PatientId;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::{Caller, Capability},
    error::{ErrorResponse, Result},
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeleteResponse {
    message: String,
    patient_id: PatientId,
}

/// Delete a patient
///
/// Removes the record permanently. Deleting the same id again yields `404`.
#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    params(
        ("id" = i64, Path, description = "The patient identifier"),
    ),
    responses(
        (status = 200, description = "Patient deleted", body = DeleteResponse),
        (status = 403, description = "The role may not delete patients", body = ErrorResponse),
        (status = 404, description = "The patient does not exist", body = ErrorResponse),
    )
)]
#[instrument(skip(store))]
#[axum::debug_handler]
pub async fn delete_patient(
    State(AppState { store, .. }): State<AppState>,
    caller: Caller,
    Path(id): Path<PatientId>,
) -> Result<Json<DeleteResponse>> {
    caller.require(Capability::DeletePatient)?;

    let removed = store.delete(id).await?;

    Ok(Json(DeleteResponse {
        message: format!("Patient {} deleted successfully", removed.name),
        patient_id: removed.id,
    }))
}
