//! Data-source descriptor parsing.
//!
//! Test adapters usually know the URL the application under test connects
//! with, not the sandbox coordinates. [`DataSource`] pulls host, port,
//! credentials and the current database name out of that URL.

use url::{Host, Url};

use crate::config::DEFAULT_PORT;
use crate::errors::{Result, SandboxError};

const JDBC_PREFIX: &str = "jdbc:";

/// Connection coordinates of the database the application uses.
#[derive(Clone, PartialEq, Eq)]
pub struct DataSource {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

impl DataSource {
    /// Parse a `postgres://`, `postgresql://` or `jdbc:postgresql://` URL.
    ///
    /// The port defaults to 5432 and query parameters are ignored. A URL
    /// without a database path is rejected because there is nothing to sandbox.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let without_jdbc = trimmed.strip_prefix(JDBC_PREFIX).unwrap_or(trimmed);

        let url = Url::parse(without_jdbc).map_err(|e| {
            SandboxError::config_field(format!("Invalid database URL: {}", e), "database_url")
        })?;

        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(SandboxError::config_field(
                format!("database URL must use the postgresql scheme, got '{}'", url.scheme()),
                "database_url",
            ));
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => {
                return Err(SandboxError::config_field(
                    "database URL has no host",
                    "database_url",
                ))
            }
        };

        let database = url.path().trim_start_matches('/').to_string();
        if database.is_empty() {
            return Err(SandboxError::config_field(
                "database URL has no database name",
                "database_url",
            ));
        }

        let username = Some(url.username()).filter(|u| !u.is_empty()).map(str::to_string);

        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            username,
            password: url.password().map(str::to_string),
            database,
        })
    }
}

impl std::str::FromStr for DataSource {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}
