//! Layered sandbox settings.
//!
//! Settings are read from an optional file (any format the `config` crate
//! recognises by extension) and then from `DBSANDBOX_*` environment
//! variables, which win. Missing values fall back to the defaults used by
//! the test adapter: admin `postgres`/`postgres` on the `postgres`
//! maintenance database and a template named `template_database`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{
    DataSource, SandboxConfig, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USER, DEFAULT_HOST,
    DEFAULT_MAINTENANCE_DATABASE, DEFAULT_PORT, DEFAULT_TEMPLATE_DATABASE,
};
use crate::errors::{Result, SandboxError};
use crate::validation::validate_database_name;

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "DBSANDBOX";

/// Raw, unvalidated-until-used sandbox settings
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SandboxSettings {
    /// Application database URL; supplies host, port and primary database
    pub database_url: Option<String>,

    /// Server host, overrides the URL host
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: Option<String>,

    /// Server port, overrides the URL port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: Option<u32>,

    /// Database administrative connections are opened against
    #[validate(custom(function = "validate_database_name"))]
    pub maintenance_database: String,

    /// Role with CREATEDB privileges
    #[validate(length(min = 1, message = "Admin user cannot be empty"))]
    pub admin_user: String,

    pub admin_password: String,

    /// Database under test, overrides the URL database
    #[validate(custom(function = "validate_database_name"))]
    pub primary_database: Option<String>,

    /// Name of the frozen baseline copy
    #[validate(custom(function = "validate_database_name"))]
    pub template_database: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            host: None,
            port: None,
            maintenance_database: DEFAULT_MAINTENANCE_DATABASE.to_string(),
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            primary_database: None,
            template_database: DEFAULT_TEMPLATE_DATABASE.to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl SandboxSettings {
    /// Validate the settings with the `validator` derive rules
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(SandboxError::from)
    }

    /// Resolve the settings into a validated [`SandboxConfig`].
    ///
    /// Explicit `host`, `port` and `primary_database` win over the values
    /// parsed from `database_url`.
    pub fn into_config(self) -> Result<SandboxConfig> {
        self.validate()?;

        let source = self.database_url.as_deref().map(DataSource::parse).transpose()?;

        let host = self
            .host
            .or_else(|| source.as_ref().map(|s| s.host.clone()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = self
            .port
            .or_else(|| source.as_ref().map(|s| u32::from(s.port)))
            .unwrap_or(u32::from(DEFAULT_PORT));
        let primary_database = self
            .primary_database
            .or_else(|| source.as_ref().map(|s| s.database.clone()))
            .ok_or_else(|| {
                SandboxError::config_field(
                    "primary_database must be set, directly or through database_url",
                    "primary_database",
                )
            })?;

        SandboxConfig::new(
            host,
            port,
            self.maintenance_database,
            self.admin_user,
            self.admin_password,
            primary_database,
            self.template_database,
        )
    }
}

impl std::fmt::Debug for SandboxSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxSettings")
            .field("database_url", &self.database_url.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("maintenance_database", &self.maintenance_database)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"***")
            .field("primary_database", &self.primary_database)
            .field("template_database", &self.template_database)
            .field("log_level", &self.log_level)
            .field("json_logging", &self.json_logging)
            .finish()
    }
}

/// Load settings from an optional file plus the `DBSANDBOX_*` environment.
pub fn load_settings(path: Option<&Path>) -> Result<SandboxSettings> {
    load_settings_with_env(path, config::Environment::with_prefix(ENV_PREFIX))
}

fn load_settings_with_env(
    path: Option<&Path>,
    environment: config::Environment,
) -> Result<SandboxSettings> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(SandboxError::config_field(
                format!("Settings file not found: {}", path.display()),
                "config",
            ));
        }
        builder = builder.add_source(config::File::from(path));
    }

    let settings: SandboxSettings = builder
        .add_source(environment.try_parsing(true))
        .build()?
        .try_deserialize()?;

    tracing::debug!(settings = ?settings, "Loaded sandbox settings");
    Ok(settings)
}
