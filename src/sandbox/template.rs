//! Template lifecycle.
//!
//! Builds the template database from the primary database exactly once per
//! readiness cycle. The primary is flagged as a template only for the
//! duration of the clone; afterwards the flag moves to the new copy.

use std::sync::Arc;

use sqlx::postgres::PgConnection;
use tracing::{info, warn, Instrument};

use crate::config::SandboxConfig;
use crate::errors::{Result, SandboxError};
use crate::sandbox::gate::TemplateGate;
use crate::sandbox_span;
use crate::storage::{self, statements, AdminConnector};

/// What a call to `prepare` ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// The readiness flag was already set; no I/O happened
    AlreadyReady,
    /// A template database from an earlier run was reused
    TemplateFound,
    /// The template database was cloned from the primary database
    TemplateCreated,
}

impl std::fmt::Display for PrepareOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrepareOutcome::AlreadyReady => write!(f, "already_ready"),
            PrepareOutcome::TemplateFound => write!(f, "template_found"),
            PrepareOutcome::TemplateCreated => write!(f, "template_created"),
        }
    }
}

/// Owns the one-time construction of the template database.
#[derive(Debug, Clone)]
pub struct TemplateManager {
    config: Arc<SandboxConfig>,
    connector: AdminConnector,
    gate: Arc<TemplateGate>,
}

impl TemplateManager {
    pub fn new(config: Arc<SandboxConfig>, connector: AdminConnector, gate: Arc<TemplateGate>) -> Self {
        Self { config, connector, gate }
    }

    pub fn gate(&self) -> &Arc<TemplateGate> {
        &self.gate
    }

    /// Make sure the template exists, building it if needed.
    pub async fn prepare(&self) -> Result<PrepareOutcome> {
        if self.gate.is_ready() {
            tracing::debug!(template = %self.config.template_database(), "Template already prepared");
            return Ok(PrepareOutcome::AlreadyReady);
        }

        let span = sandbox_span!(
            "prepare",
            primary = %self.config.primary_database(),
            template = %self.config.template_database()
        );

        let outcome = self.gate.ensure(|| self.prepare_locked()).instrument(span).await?;
        Ok(outcome.unwrap_or(PrepareOutcome::AlreadyReady))
    }

    async fn prepare_locked(&self) -> Result<PrepareOutcome> {
        let mut conn = self.connector.open().await?;
        let result = self.find_or_create(&mut conn).await;
        storage::release(conn).await;
        result
    }

    async fn find_or_create(&self, conn: &mut PgConnection) -> Result<PrepareOutcome> {
        let template = self.config.template_database();

        let exists = storage::template_exists(conn, template).await.map_err(|e| {
            tracing::error!(error = %e, template = %template, "Template lookup failed");
            SandboxError::preparation(e, format!("Failed to look up template database '{}'", template))
        })?;

        if exists {
            warn!(template = %template, "Reusing template database left by an earlier run");
            return Ok(PrepareOutcome::TemplateFound);
        }

        info!(template = %template, "Building template database");
        self.create_template(conn).await?;
        info!(template = %template, "Template database ready");
        Ok(PrepareOutcome::TemplateCreated)
    }

    async fn create_template(&self, conn: &mut PgConnection) -> Result<()> {
        let primary = self.config.primary_database();
        let template = self.config.template_database();

        let terminated = storage::terminate_sessions(conn, primary).await.map_err(|e| {
            SandboxError::preparation(
                e,
                format!("Failed to terminate sessions on primary database '{}'", primary),
            )
        })?;
        tracing::debug!(primary = %primary, terminated, "Terminated primary database sessions");

        storage::execute_ddl(conn, &statements::set_template_flag(primary, true))
            .await
            .map_err(|e| {
                SandboxError::preparation(
                    e,
                    format!("Failed to mark primary database '{}' as a template", primary),
                )
            })?;

        if let Err(err) = self.clone_and_flip(conn).await {
            // Leave the primary connectable for the caller's next attempt.
            if let Err(e) =
                storage::execute_ddl(conn, &statements::set_template_flag(primary, false)).await
            {
                warn!(error = %e, primary = %primary, "Failed to clear template flag on primary database");
            }
            tracing::error!(error = %err, template = %template, "Template construction failed");
            return Err(err);
        }

        Ok(())
    }

    async fn clone_and_flip(&self, conn: &mut PgConnection) -> Result<()> {
        let primary = self.config.primary_database();
        let template = self.config.template_database();

        if let Err(e) =
            storage::execute_ddl(conn, &statements::create_from_template(template, primary)).await
        {
            // Only reached after the template lookup missed, so any match here is a plain database.
            let leftover = storage::database_exists(conn, template).await.unwrap_or(false);
            return Err(SandboxError::preparation(e, clone_failure_context(primary, template, leftover)));
        }

        storage::execute_ddl(conn, &statements::set_template_flag(primary, false))
            .await
            .map_err(|e| {
                SandboxError::preparation(
                    e,
                    format!("Failed to clear template flag on primary database '{}'", primary),
                )
            })?;

        storage::execute_ddl(conn, &statements::set_template_flag(template, true))
            .await
            .map_err(|e| {
                SandboxError::preparation(
                    e,
                    format!("Failed to mark '{}' as a template", template),
                )
            })?;

        Ok(())
    }
}

fn clone_failure_context(primary: &str, template: &str, leftover: bool) -> String {
    let mut context = format!("Failed to clone '{}' into template '{}'", primary, template);
    if leftover {
        context.push_str(&format!(
            "; a database named '{}' exists but is not marked as a template, drop it to let prepare rebuild it",
            template
        ));
    }
    context
}
