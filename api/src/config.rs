use db::dashboard::{DEFAULT_RECENT_LIMIT, DEFAULT_TREND_WEEKS, DashboardOptions};
use eyre::{Context as _, Result, bail};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub env: Environment,

    #[serde(default)]
    pub storage: StorageBackend,

    /// Required when `storage` is `postgres`.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Role assumed for requests without a role header. Unset means such requests are rejected.
    #[serde(default)]
    pub default_role: Option<Role>,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_trend_weeks")]
    pub trend_weeks: u32,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

/// Upper bound for `dashboard.trend_weeks`, about ten years.
pub const MAX_TREND_WEEKS: u32 = 520;

const fn default_max_connections() -> u32 {
    10
}

const fn default_port() -> u16 {
    5000
}

const fn default_trend_weeks() -> u32 {
    DEFAULT_TREND_WEEKS
}

const fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            trend_weeks: default_trend_weeks(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl DashboardConfig {
    /// Options for a dashboard computed now.
    pub fn options(&self) -> DashboardOptions {
        DashboardOptions::new(self.trend_weeks, self.recent_limit)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            storage: StorageBackend::default(),
            database_url: None,
            max_connections: default_max_connections(),
            port: default_port(),
            default_role: None,
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Configuration {
    /// Loads the configuration from environment variables, and configuration files.
    ///
    /// Variables use the `HOSPITAL_` prefix, nested keys are separated by `__`
    /// (e.g. `HOSPITAL_DASHBOARD__TREND_WEEKS`).
    pub fn load() -> Result<Self> {
        let mut cfg = config::Config::builder().add_source(
            config::Environment::with_prefix("HOSPITAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(file) = std::env::var("HOSPITAL_CONFIG_FILE") {
            cfg = cfg.add_source(config::File::with_name(&file));
        }

        Self::from_builder(cfg)
    }

    /// Builds and validates the configuration from the given sources.
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let cfg = builder
            .build()
            .wrap_err("failed to build config")?
            .try_deserialize::<Self>()
            .wrap_err("failed to deserialize config")?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.storage == StorageBackend::Postgres && self.database_url.is_none() {
            bail!("`database_url` is required when `storage` is `postgres`");
        }

        if !(1..=MAX_TREND_WEEKS).contains(&self.dashboard.trend_weeks) {
            bail!("`dashboard.trend_weeks` must be between 1 and {MAX_TREND_WEEKS}");
        }

        Ok(())
    }

    #[inline]
    pub fn is_production(&self) -> bool {
        self.env == Environment::Production
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Environment {
    #[serde(rename = "development")]
    Development,

    #[serde(rename = "production")]
    #[default]
    Production,
}

/// Where patient records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process memory; records are lost on restart.
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> config::ConfigBuilder<config::builder::DefaultState> {
        config::Config::builder()
    }

    #[test]
    fn defaults_apply() {
        let cfg = Configuration::from_builder(
            builder()
                .set_override("database_url", "postgres://localhost/hospital")
                .unwrap(),
        )
        .unwrap();

        assert_eq!(cfg.env, Environment::Production);
        assert_eq!(cfg.storage, StorageBackend::Postgres);
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.default_role, None);
        assert_eq!(cfg.dashboard, DashboardConfig::default());
    }

    #[test]
    fn reads_nested_and_enum_values() {
        let cfg = Configuration::from_builder(
            builder()
                .set_override("env", "development")
                .unwrap()
                .set_override("storage", "memory")
                .unwrap()
                .set_override("default_role", "nurse")
                .unwrap()
                .set_override("dashboard.trend_weeks", 12)
                .unwrap(),
        )
        .unwrap();

        assert!(!cfg.is_production());
        assert_eq!(cfg.storage, StorageBackend::Memory);
        assert_eq!(cfg.default_role, Some(Role::Nurse));
        assert_eq!(cfg.dashboard.trend_weeks, 12);
        assert_eq!(cfg.dashboard.recent_limit, DEFAULT_RECENT_LIMIT);
    }

    #[test]
    fn postgres_requires_a_database_url() {
        assert!(Configuration::from_builder(builder()).is_err());
    }

    #[test]
    fn trend_window_must_not_be_empty() {
        let result = Configuration::from_builder(
            builder()
                .set_override("storage", "memory")
                .unwrap()
                .set_override("dashboard.trend_weeks", 0)
                .unwrap(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn trend_window_is_capped() {
        let with_weeks = |weeks: u32| {
            Configuration::from_builder(
                builder()
                    .set_override("storage", "memory")
                    .unwrap()
                    .set_override("dashboard.trend_weeks", weeks)
                    .unwrap(),
            )
        };

        assert_eq!(
            with_weeks(MAX_TREND_WEEKS).unwrap().dashboard.trend_weeks,
            MAX_TREND_WEEKS
        );

        let err = with_weeks(4_000_000_000).unwrap_err();
        assert!(err.to_string().contains("between 1 and 520"), "{err}");
    }
}
