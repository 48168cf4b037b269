//! Single patient lookup.

use axum::{
    Json,
    extract::{Path, State},
};
use db::{Patient, PatientId};
use tracing::instrument;

use crate::{
    AppState,
    auth::{Caller, Capability},
    error::{ErrorResponse, Result},
};

/// Get a patient by id
#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(
        ("id" = i64, Path, description = "The patient identifier"),
    ),
    responses(
        (status = 200, description = "Returns the patient record", body = Patient),
        (status = 404, description = "The patient does not exist", body = ErrorResponse),
    )
)]
#[instrument(skip(store))]
#[axum::debug_handler]
pub async fn get_patient(
    State(AppState { store, .. }): State<AppState>,
    caller: Caller,
    Path(id): Path<PatientId>,
) -> Result<Json<Patient>> {
    caller.require(Capability::ViewRecords)?;

    Ok(Json(store.get(id).await?))
}
