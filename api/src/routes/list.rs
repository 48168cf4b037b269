//! Patient list and search endpoint.

use axum::{
    Json,
    extract::{Query, State},
};
use db::{ListOrder, Patient, PatientFilter, PatientId, PatientStatus};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::{
    AppState,
    auth::{Caller, Capability},
    error::{AppError, ErrorResponse, Result},
};

/// Query parameters for list and search operations.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQueryParams {
    /// `admitted` or `discharged`.
    status: Option<String>,

    /// Case-insensitive match on name or condition, or the exact id when numeric.
    search: Option<String>,

    name: Option<String>,

    condition: Option<String>,

    /// Exact patient identifier.
    id: Option<PatientId>,

    /// `created` (default), `newest` or `admission`.
    order: Option<String>,

    #[param(minimum = 1)]
    limit: Option<u32>,

    #[param(minimum = 0)]
    offset: Option<u32>,
}

impl ListQueryParams {
    fn into_filter(self) -> Result<PatientFilter> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<PatientStatus>)
            .transpose()
            .map_err(|err| AppError::BadRequest(format!("invalid status filter: {err}").into()))?;

        let order = self
            .order
            .as_deref()
            .map(str::parse::<ListOrder>)
            .transpose()
            .map_err(|err| AppError::BadRequest(format!("invalid order: {err}").into()))?
            .unwrap_or_default();

        Ok(PatientFilter {
            status,
            search: self.search,
            name: self.name,
            condition: self.condition,
            id: self.id,
            order,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatientList {
    /// Number of records in `patients`.
    count: usize,
    patients: Vec<Patient>,
}

/// List patients
///
/// Every filter is optional and they combine with AND. Without `limit` the full
/// result set is returned.
#[utoipa::path(
    get,
    path = "/api/patients",
    params(ListQueryParams),
    responses(
        (status = 200, description = "The matching patients", body = PatientList),
        (status = 400, description = "A filter value is malformed", body = ErrorResponse),
    )
)]
#[instrument(skip(store))]
#[axum::debug_handler]
pub async fn list_patients(
    State(AppState { store, .. }): State<AppState>,
    caller: Caller,
    Query(params): Query<ListQueryParams>,
) -> Result<Json<PatientList>> {
    caller.require(Capability::ViewRecords)?;

    let filter = params.into_filter()?;
    let patients = store.list(&filter).await?;

    Ok(Json(PatientList {
        count: patients.len(),
        patients,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything() {
        let filter = ListQueryParams::default().into_filter().unwrap();
        assert_eq!(filter, PatientFilter::default());
    }

    #[test]
    fn parses_status_and_order() {
        let filter = ListQueryParams {
            status: Some("Discharged".into()),
            order: Some("admission".into()),
            limit: Some(10),
            ..Default::default()
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.status, Some(PatientStatus::Discharged));
        assert_eq!(filter.order, ListOrder::Admission);
        assert_eq!(filter.limit, Some(10));
    }

    #[test]
    fn rejects_unknown_values() {
        let bad_status = ListQueryParams {
            status: Some("asleep".into()),
            ..Default::default()
        };
        assert!(matches!(bad_status.into_filter(), Err(AppError::BadRequest(_))));

        let bad_order = ListQueryParams {
            order: Some("alphabetical".into()),
            ..Default::default()
        };
        assert!(matches!(bad_order.into_filter(), Err(AppError::BadRequest(_))));
    }
}
