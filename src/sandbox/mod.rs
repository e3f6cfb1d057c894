//! # Sandbox Lifecycle
//!
//! The two lifecycle operations every provider offers:
//!
//! - `prepare` runs once before any test and builds the template database
//!   from the primary database if it does not exist yet. It is idempotent and
//!   safe to call from any number of concurrent callers.
//! - `rebuild` runs before each test and resets the primary database to a
//!   physical clone of the template.
//!
//! ```rust,no_run
//! use dbsandbox::{PostgresSandboxProvider, SandboxConfig, SandboxProvider};
//!
//! # async fn run() -> dbsandbox::Result<()> {
//! let config = SandboxConfig::builder().primary_database("shop").build()?;
//! let provider = PostgresSandboxProvider::new(config);
//!
//! provider.prepare().await?;
//! provider.rebuild().await?;
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod gate;
pub mod postgres;
pub mod rebuild;
pub mod template;

pub use blocking::BlockingSandbox;
pub use gate::TemplateGate;
pub use postgres::PostgresSandboxProvider;
pub use rebuild::SandboxRebuilder;
pub use template::{PrepareOutcome, TemplateManager};

use async_trait::async_trait;

use crate::errors::Result;

/// Lifecycle contract consumed by test-framework adapters
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Build the template once; later calls return without I/O.
    async fn prepare(&self) -> Result<()>;

    /// Reset the primary database from the template.
    async fn rebuild(&self) -> Result<()>;
}
