//! # Configuration Management
//!
//! [`SandboxConfig`] is the immutable set of coordinates a provider works
//! with. It is validated once, when built, and never mutated afterwards.
//!
//! [`SandboxSettings`] is the layered (file + environment) form used by the
//! CLI and by test adapters; [`DataSource`] derives coordinates from the
//! connection URL an application already uses.

pub mod datasource;
pub mod settings;

pub use datasource::DataSource;
pub use settings::{load_settings, SandboxSettings};

use crate::errors::{Result, SandboxError};
use crate::validation::{validate_identifier, validate_port};

/// Default PostgreSQL host
pub const DEFAULT_HOST: &str = "localhost";
/// Default PostgreSQL port
pub const DEFAULT_PORT: u16 = 5432;
/// Default maintenance database used for administrative connections
pub const DEFAULT_MAINTENANCE_DATABASE: &str = "postgres";
/// Default administrative role
pub const DEFAULT_ADMIN_USER: &str = "postgres";
/// Default administrative password
pub const DEFAULT_ADMIN_PASSWORD: &str = "postgres";
/// Default name of the template database
pub const DEFAULT_TEMPLATE_DATABASE: &str = "template_database";

/// Validated sandbox coordinates.
#[derive(Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    host: String,
    port: u16,
    maintenance_database: String,
    admin_user: String,
    admin_password: String,
    primary_database: String,
    template_database: String,
}

impl SandboxConfig {
    /// Build a configuration from explicit values.
    ///
    /// Fails with [`SandboxError::Config`] when the host is empty, the port is
    /// outside `1..=65535`, or any database name is not a safe identifier.
    pub fn new(
        host: impl Into<String>,
        port: u32,
        maintenance_database: impl Into<String>,
        admin_user: impl Into<String>,
        admin_password: impl Into<String>,
        primary_database: impl Into<String>,
        template_database: impl Into<String>,
    ) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(SandboxError::config_field("host cannot be empty", "host"));
        }
        let port = validate_port(port)?;

        let maintenance_database = maintenance_database.into();
        validate_identifier(Some(&maintenance_database), "maintenance_database")?;

        let admin_user = admin_user.into();
        if admin_user.is_empty() {
            return Err(SandboxError::config_field("admin_user cannot be empty", "admin_user"));
        }

        let primary_database = primary_database.into();
        validate_identifier(Some(&primary_database), "primary_database")?;

        let template_database = template_database.into();
        validate_identifier(Some(&template_database), "template_database")?;

        if primary_database == template_database {
            return Err(SandboxError::config_field(
                format!(
                    "template_database must differ from primary_database, both are '{}'",
                    primary_database
                ),
                "template_database",
            ));
        }

        Ok(Self {
            host,
            port,
            maintenance_database,
            admin_user,
            admin_password: admin_password.into(),
            primary_database,
            template_database,
        })
    }

    /// Start a builder pre-filled with the conventional defaults.
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }

    /// Derive coordinates from an application data source.
    ///
    /// Host, port and primary database come from `source`; the administrative
    /// fields and the template name come from `settings`.
    pub fn from_data_source(source: &DataSource, settings: &SandboxSettings) -> Result<Self> {
        Self::new(
            source.host.clone(),
            u32::from(source.port),
            settings.maintenance_database.clone(),
            settings.admin_user.clone(),
            settings.admin_password.clone(),
            source.database.clone(),
            settings.template_database.clone(),
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn maintenance_database(&self) -> &str {
        &self.maintenance_database
    }

    pub fn admin_user(&self) -> &str {
        &self.admin_user
    }

    pub(crate) fn admin_password(&self) -> &str {
        &self.admin_password
    }

    pub fn primary_database(&self) -> &str {
        &self.primary_database
    }

    pub fn template_database(&self) -> &str {
        &self.template_database
    }
}

impl std::fmt::Debug for SandboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("maintenance_database", &self.maintenance_database)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"***")
            .field("primary_database", &self.primary_database)
            .field("template_database", &self.template_database)
            .finish()
    }
}

/// Builder for [`SandboxConfig`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct SandboxConfigBuilder {
    host: String,
    port: u32,
    maintenance_database: String,
    admin_user: String,
    admin_password: String,
    primary_database: Option<String>,
    template_database: String,
}

impl Default for SandboxConfigBuilder {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: u32::from(DEFAULT_PORT),
            maintenance_database: DEFAULT_MAINTENANCE_DATABASE.to_string(),
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            primary_database: None,
            template_database: DEFAULT_TEMPLATE_DATABASE.to_string(),
        }
    }
}

impl SandboxConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u32) -> Self {
        self.port = port;
        self
    }

    pub fn maintenance_database(mut self, name: impl Into<String>) -> Self {
        self.maintenance_database = name.into();
        self
    }

    pub fn admin_user(mut self, user: impl Into<String>) -> Self {
        self.admin_user = user.into();
        self
    }

    pub fn admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = password.into();
        self
    }

    pub fn primary_database(mut self, name: impl Into<String>) -> Self {
        self.primary_database = Some(name.into());
        self
    }

    pub fn template_database(mut self, name: impl Into<String>) -> Self {
        self.template_database = name.into();
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<SandboxConfig> {
        let primary_database = self.primary_database.ok_or_else(|| {
            SandboxError::config_field("primary_database must be set", "primary_database")
        })?;

        SandboxConfig::new(
            self.host,
            self.port,
            self.maintenance_database,
            self.admin_user,
            self.admin_password,
            primary_database,
            self.template_database,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SandboxConfig {
        SandboxConfig::new("db.local", 5433, "postgres", "admin", "secret", "app", "app_template")
            .unwrap()
    }

    #[test]
    fn test_new_keeps_values() {
        let config = valid();
        assert_eq!(config.host(), "db.local");
        assert_eq!(config.port(), 5433);
        assert_eq!(config.maintenance_database(), "postgres");
        assert_eq!(config.admin_user(), "admin");
        assert_eq!(config.admin_password(), "secret");
        assert_eq!(config.primary_database(), "app");
        assert_eq!(config.template_database(), "app_template");
    }

    #[test]
    fn test_rejects_out_of_range_ports() {
        for port in [0, 65536, 100_000] {
            let err = SandboxConfig::new("h", port, "postgres", "u", "p", "app", "tpl").unwrap_err();
            assert_eq!(err.field(), Some("port"));
        }
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let err =
            SandboxConfig::new("h", 5432, "post-gres", "u", "p", "app", "tpl").unwrap_err();
        assert_eq!(err.field(), Some("maintenance_database"));

        let err = SandboxConfig::new("h", 5432, "postgres", "u", "p", "app;--", "tpl").unwrap_err();
        assert_eq!(err.field(), Some("primary_database"));

        let err = SandboxConfig::new("h", 5432, "postgres", "u", "p", "app", "9tpl").unwrap_err();
        assert_eq!(err.field(), Some("template_database"));
    }

    #[test]
    fn test_rejects_empty_host_and_user() {
        let err = SandboxConfig::new("  ", 5432, "postgres", "u", "p", "app", "tpl").unwrap_err();
        assert_eq!(err.field(), Some("host"));

        let err = SandboxConfig::new("h", 5432, "postgres", "", "p", "app", "tpl").unwrap_err();
        assert_eq!(err.field(), Some("admin_user"));
    }

    #[test]
    fn test_rejects_same_primary_and_template() {
        let err = SandboxConfig::new("h", 5432, "postgres", "u", "p", "app", "app").unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_builder_defaults() {
        let config = SandboxConfig::builder().primary_database("orders").build().unwrap();
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.maintenance_database(), DEFAULT_MAINTENANCE_DATABASE);
        assert_eq!(config.admin_user(), DEFAULT_ADMIN_USER);
        assert_eq!(config.template_database(), DEFAULT_TEMPLATE_DATABASE);
    }

    #[test]
    fn test_builder_requires_primary() {
        let err = SandboxConfig::builder().build().unwrap_err();
        assert_eq!(err.field(), Some("primary_database"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = SandboxConfig::builder()
            .host("10.0.0.5")
            .port(6543)
            .maintenance_database("maint")
            .admin_user("root")
            .admin_password("pw")
            .primary_database("shop")
            .template_database("shop_tpl")
            .build()
            .unwrap();
        assert_eq!(config.host(), "10.0.0.5");
        assert_eq!(config.port(), 6543);
        assert_eq!(config.template_database(), "shop_tpl");
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_from_data_source() {
        let source = DataSource::parse("postgresql://app:pw@pg.internal:6000/shop?sslmode=disable")
            .unwrap();
        let settings = SandboxSettings::default();

        let config = SandboxConfig::from_data_source(&source, &settings).unwrap();
        assert_eq!(config.host(), "pg.internal");
        assert_eq!(config.port(), 6000);
        assert_eq!(config.primary_database(), "shop");
        assert_eq!(config.admin_user(), DEFAULT_ADMIN_USER);
        assert_eq!(config.template_database(), DEFAULT_TEMPLATE_DATABASE);
    }
}
