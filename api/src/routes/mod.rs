use axum::Router;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_scalar::{Scalar, Servable as _};

use crate::AppState;

mod create;
mod dashboard;
mod delete;
mod discharge;
mod get;
mod health;
mod list;
mod update;

pub fn build_router() -> Router<AppState> {
    let (router, openapi) = OpenApiRouter::<AppState>::new()
        .routes(routes!(health::health))
        .routes(routes!(dashboard::get_dashboard))
        .routes(routes!(dashboard::get_stats))
        .routes(routes!(list::list_patients, create::create_patient))
        .routes(routes!(
            get::get_patient,
            update::update_patient,
            delete::delete_patient
        ))
        .routes(routes!(discharge::discharge_patient))
        .split_for_parts();

    router.merge(Scalar::with_url("/docs", openapi))
}
