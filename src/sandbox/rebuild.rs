//! Sandbox rebuild.
//!
//! Resets the primary database by dropping it and cloning it again from the
//! template. No readiness check happens here: calling `rebuild` before
//! `prepare` fails inside PostgreSQL, because the template does not exist.
//!
//! There is no locking either. Two concurrent rebuilds of the same primary
//! database race each other; tests sharing one sandbox must run serially.

use std::sync::Arc;
use std::time::Instant;

use sqlx::postgres::PgConnection;
use tracing::Instrument;

use crate::config::SandboxConfig;
use crate::errors::{Result, SandboxError};
use crate::sandbox_span;
use crate::storage::{self, statements, AdminConnector};

#[derive(Debug, Clone)]
pub struct SandboxRebuilder {
    config: Arc<SandboxConfig>,
    connector: AdminConnector,
}

impl SandboxRebuilder {
    pub fn new(config: Arc<SandboxConfig>, connector: AdminConnector) -> Self {
        Self { config, connector }
    }

    /// Drop the primary database and recreate it from the template.
    ///
    /// Every step can be repeated safely, so a failed call may simply be retried.
    pub async fn rebuild(&self) -> Result<()> {
        let span = sandbox_span!(
            "rebuild",
            primary = %self.config.primary_database(),
            template = %self.config.template_database()
        );

        async {
            let started = Instant::now();
            let mut conn = self.connector.open().await?;
            let result = self.reset_primary(&mut conn).await;
            storage::release(conn).await;

            match &result {
                Ok(()) => tracing::debug!(
                    elapsed = ?started.elapsed(),
                    "Primary database rebuilt from template"
                ),
                Err(e) => tracing::error!(error = %e, "Sandbox rebuild failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn reset_primary(&self, conn: &mut PgConnection) -> Result<()> {
        let primary = self.config.primary_database();
        let template = self.config.template_database();

        let terminated = storage::terminate_sessions(conn, primary).await.map_err(|e| {
            SandboxError::operation(
                e,
                format!("Failed to terminate sessions on primary database '{}'", primary),
            )
        })?;
        if terminated > 0 {
            tracing::debug!(terminated, "Terminated sessions on primary database");
        }

        storage::execute_ddl(conn, &statements::drop_if_exists(primary)).await.map_err(|e| {
            SandboxError::operation(e, format!("Failed to drop primary database '{}'", primary))
        })?;

        storage::execute_ddl(conn, &statements::create_from_template(primary, template))
            .await
            .map_err(|e| {
                SandboxError::operation(
                    e,
                    format!("Failed to recreate '{}' from template '{}'", primary, template),
                )
            })?;

        Ok(())
    }
}
