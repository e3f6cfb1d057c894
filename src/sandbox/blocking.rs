//! Blocking facade.
//!
//! Test runners usually drive tests from plain worker threads. This wrapper
//! owns a small tokio runtime and blocks the calling thread until the
//! database round trips finish. Do not use it from inside an async runtime;
//! `block_on` panics there.

use std::sync::Arc;

use crate::config::SandboxConfig;
use crate::errors::{Result, SandboxError};
use crate::sandbox::{PostgresSandboxProvider, SandboxProvider};

/// Synchronous `prepare` / `rebuild` over any [`SandboxProvider`]
pub struct BlockingSandbox {
    provider: Arc<dyn SandboxProvider>,
    runtime: tokio::runtime::Runtime,
}

impl BlockingSandbox {
    /// Wrap an existing provider
    pub fn new(provider: Arc<dyn SandboxProvider>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("dbsandbox")
            .enable_all()
            .build()
            .map_err(|e| SandboxError::Runtime {
                source: e,
                context: "Failed to start sandbox runtime".to_string(),
            })?;

        Ok(Self { provider, runtime })
    }

    /// Build a PostgreSQL provider on the process-wide gate and wrap it
    pub fn postgres(config: SandboxConfig) -> Result<Self> {
        Self::new(Arc::new(PostgresSandboxProvider::new(config)))
    }

    /// Blocking [`SandboxProvider::prepare`]
    pub fn prepare(&self) -> Result<()> {
        self.runtime.block_on(self.provider.prepare())
    }

    /// Blocking [`SandboxProvider::rebuild`]
    pub fn rebuild(&self) -> Result<()> {
        self.runtime.block_on(self.provider.rebuild())
    }

    pub fn provider(&self) -> &Arc<dyn SandboxProvider> {
        &self.provider
    }
}

impl std::fmt::Debug for BlockingSandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingSandbox").finish_non_exhaustive()
    }
}
