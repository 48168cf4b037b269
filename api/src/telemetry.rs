use eyre::{Context as _, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use crate::config::Configuration;

/// Installs the global `tracing` subscriber.
///
/// Production emits one JSON object per event, development a human-readable format.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init(config: &Configuration) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
    };

    installed.wrap_err("failed to install tracing subscriber")
}
