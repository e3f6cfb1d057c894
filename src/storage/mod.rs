//! # Administrative Connections
//!
//! Every administrative step opens its own connection to the maintenance
//! database, uses it, and closes it. Nothing is pooled: the operations are
//! rare, and the session running `DROP DATABASE` must never be one that a
//! test could also have checked out.

pub mod statements;

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Executor};
use tracing::instrument;

use crate::config::SandboxConfig;
use crate::errors::{Result, SandboxError};

const APPLICATION_NAME: &str = "dbsandbox";

/// Opens short-lived connections to the maintenance database.
#[derive(Clone)]
pub struct AdminConnector {
    options: PgConnectOptions,
    target: String,
}

impl AdminConnector {
    pub fn new(config: &SandboxConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(config.host())
            .port(config.port())
            .username(config.admin_user())
            .password(config.admin_password())
            .database(config.maintenance_database())
            .application_name(APPLICATION_NAME);

        Self {
            options,
            target: format!(
                "{}:{}/{}",
                config.host(),
                config.port(),
                config.maintenance_database()
            ),
        }
    }

    /// Host, port and maintenance database, without credentials
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Open a fresh administrative connection.
    #[instrument(skip(self), fields(target = %self.target), name = "db_open_admin_connection")]
    pub async fn open(&self) -> Result<PgConnection> {
        PgConnection::connect_with(&self.options).await.map_err(|e| {
            tracing::error!(error = %e, target = %self.target, "Failed to open admin connection");
            SandboxError::connection(
                e,
                format!("Failed to connect to maintenance database {}", self.target),
            )
        })
    }
}

impl std::fmt::Debug for AdminConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConnector").field("target", &self.target).finish()
    }
}

/// Close an administrative connection, logging rather than failing.
pub async fn release(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "Admin connection did not close cleanly");
    }
}

/// Terminate every session on `database` except the caller's own.
///
/// Returns how many backends were signalled; zero is not an error.
pub async fn terminate_sessions(conn: &mut PgConnection, database: &str) -> sqlx::Result<usize> {
    let rows = sqlx::query(statements::TERMINATE_SESSIONS)
        .bind(database)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.len())
}

/// Whether a database named `name` exists and is flagged as a template.
pub async fn template_exists(conn: &mut PgConnection, name: &str) -> sqlx::Result<bool> {
    let found: Option<i32> = sqlx::query_scalar(statements::TEMPLATE_EXISTS)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

/// Whether any database named `name` exists.
pub async fn database_exists(conn: &mut PgConnection, name: &str) -> sqlx::Result<bool> {
    let found: Option<i32> = sqlx::query_scalar(statements::DATABASE_EXISTS)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

/// Run a DDL statement over the simple query protocol.
///
/// `CREATE DATABASE` and `DROP DATABASE` refuse to run inside a transaction
/// block, and unparameterised text never goes through a prepared statement.
pub async fn execute_ddl(conn: &mut PgConnection, sql: &str) -> sqlx::Result<()> {
    tracing::trace!(sql = %sql, "Executing administrative DDL");
    (&mut *conn).execute(sql).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector() -> AdminConnector {
        let config =
            SandboxConfig::new("127.0.0.1", 1, "postgres", "admin", "s3cret", "app", "app_tpl")
                .unwrap();
        AdminConnector::new(&config)
    }

    #[test]
    fn test_target_has_no_credentials() {
        let connector = connector();
        assert_eq!(connector.target(), "127.0.0.1:1/postgres");
        let rendered = format!("{:?}", connector);
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("admin"));
    }

    #[tokio::test]
    async fn test_open_fails_with_connection_error() {
        // Port 1 on loopback refuses connections.
        let err = connector().open().await.unwrap_err();
        assert!(matches!(err, SandboxError::Connection { .. }));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("127.0.0.1:1/postgres"));
    }
}
