use std::sync::Arc;

use api::{
    AppState,
    config::{Configuration, StorageBackend},
};
use db::{MemoryPatientStore, PatientStore, PgPatientStore};
use eyre::{Context as _, OptionExt as _, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

async fn open_store(config: &Configuration) -> Result<Arc<dyn PatientStore>> {
    match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_eyre("`database_url` is not set")?;

            let store = PgPatientStore::connect(url, config.max_connections)
                .await
                .wrap_err("could not initialize database connection")?;

            store
                .ping()
                .await
                .wrap_err("health check to database failed")?;

            store
                .migrate()
                .await
                .wrap_err("failed to run database migrations")?;

            info!("database connection established");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage, records are lost on shutdown");
            Ok(Arc::new(MemoryPatientStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // load env variables, this is mainly useful for development
    let _ = dotenv::dotenv();

    let config = Configuration::load()?;
    api::telemetry::init(&config)?;

    let store = open_store(&config).await?;
    let port = config.port;

    let router = api::router(AppState::new(config, store));

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .wrap_err("failed to start listener")?;

    info!(port, "starting HTTP server");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("shutting down server");
        })
        .await
        .wrap_err("could not start HTTP server")?;

    Ok(())
}
