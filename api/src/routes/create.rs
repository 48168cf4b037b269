//! The admit patient route.

use axum::{Json, extract::State, http::StatusCode};
use db::{NewPatient, Patient};
use tracing::instrument;

use crate::{
    AppState,
    auth::{Caller, Capability},
    error::{ErrorResponse, Result},
    extract::JsonBody,
};

/// Admit a new patient
///
/// `name`, `age`, `gender`, `contact` and `condition` are required. The admission date
/// defaults to today and the record always starts as `admitted`.
#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = NewPatient,
    responses(
        (status = 201, description = "Patient admitted", body = Patient),
        (status = 400, description = "The record is invalid", body = ErrorResponse),
    )
)]
#[instrument(skip(store, body))]
#[axum::debug_handler]
pub async fn create_patient(
    State(AppState { store, .. }): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<NewPatient>,
) -> Result<(StatusCode, Json<Patient>)> {
    caller.require(Capability::AdmitPatient)?;

    let patient = store.create(&body).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}
