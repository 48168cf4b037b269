use std::sync::Arc;

use axum::{Router, middleware::from_fn};
use db::PatientStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Configuration;

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod telemetry;

/// Central application state that is shared across all parts of the API.
#[derive(Clone)]
pub struct AppState {
    /// The config data.
    pub config: Arc<Configuration>,

    /// The patient record store.
    pub store: Arc<dyn PatientStore>,
}

impl AppState {
    pub fn new(config: Configuration, store: Arc<dyn PatientStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

/// Builds the complete HTTP application for `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        // must be after route registration, in order to run correctly
        .layer(from_fn(error::log_app_error))
        .with_state(state)
}
