//! PostgreSQL sandbox provider.
//!
//! Uses PostgreSQL's `CREATE DATABASE ... TEMPLATE ...` to copy the database
//! files directly instead of replaying migrations, which makes a rebuild a
//! matter of milliseconds.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{SandboxConfig, SandboxSettings};
use crate::errors::{Result, SandboxError};
use crate::sandbox::{
    PrepareOutcome, SandboxProvider, SandboxRebuilder, TemplateGate, TemplateManager,
};
use crate::storage::{self, AdminConnector};

/// Provider facade composing template preparation and rebuilds.
#[derive(Debug, Clone)]
pub struct PostgresSandboxProvider {
    config: Arc<SandboxConfig>,
    connector: AdminConnector,
    template: TemplateManager,
    rebuilder: SandboxRebuilder,
}

impl PostgresSandboxProvider {
    /// Create a provider sharing the process-wide readiness gate.
    ///
    /// Every provider built this way shares one readiness flag. Once any of
    /// them has prepared a template, `prepare` on the others returns
    /// [`PrepareOutcome::AlreadyReady`] without I/O, even when they point at a
    /// different server or template. Use [`with_gate`](Self::with_gate) to give
    /// such a provider its own flag.
    pub fn new(config: SandboxConfig) -> Self {
        Self::with_gate(config, TemplateGate::global())
    }

    /// Create a provider with its own readiness gate.
    ///
    /// Useful when one process sandboxes several servers, and in tests that
    /// need to simulate a fresh process.
    pub fn with_gate(config: SandboxConfig, gate: Arc<TemplateGate>) -> Self {
        let config = Arc::new(config);
        let connector = AdminConnector::new(&config);

        Self {
            template: TemplateManager::new(config.clone(), connector.clone(), gate),
            rebuilder: SandboxRebuilder::new(config.clone(), connector.clone()),
            connector,
            config,
        }
    }

    /// Resolve settings and create a provider on the process-wide gate
    pub fn from_settings(settings: SandboxSettings) -> Result<Self> {
        Ok(Self::new(settings.into_config()?))
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn gate(&self) -> &Arc<TemplateGate> {
        self.template.gate()
    }

    /// Like [`SandboxProvider::prepare`], reporting what actually happened
    pub async fn prepare_with_outcome(&self) -> Result<PrepareOutcome> {
        self.template.prepare().await
    }

    /// Whether the template database currently exists, as seen by the catalog
    pub async fn template_exists(&self) -> Result<bool> {
        let template = self.config.template_database();
        let mut conn = self.connector.open().await?;
        let result = storage::template_exists(&mut conn, template).await.map_err(|e| {
            SandboxError::operation(e, format!("Failed to look up template database '{}'", template))
        });
        storage::release(conn).await;
        result
    }
}

#[async_trait]
impl SandboxProvider for PostgresSandboxProvider {
    async fn prepare(&self) -> Result<()> {
        self.template.prepare().await.map(|_| ())
    }

    async fn rebuild(&self) -> Result<()> {
        self.rebuilder.rebuild().await
    }
}
