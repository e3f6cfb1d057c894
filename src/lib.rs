//! # dbsandbox
//!
//! Per-test PostgreSQL databases in milliseconds. Instead of replaying
//! migrations and fixtures before every test, the primary database is frozen
//! once into a *template* database, and every test starts from a fresh
//! physical clone of it made with `CREATE DATABASE ... TEMPLATE ...`.
//!
//! ## Lifecycle
//!
//! ```text
//! prepare()  once per process   primary ──clone──▶ template (frozen)
//! rebuild()  before each test   drop primary; template ──clone──▶ primary
//! ```
//!
//! Both operations open their own short-lived administrative connection to
//! a maintenance database, terminate any sessions still attached to the
//! primary database, and surface failures as [`SandboxError`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dbsandbox::{BlockingSandbox, SandboxConfig};
//!
//! fn main() -> dbsandbox::Result<()> {
//!     let config = SandboxConfig::builder()
//!         .host("localhost")
//!         .port(5432)
//!         .primary_database("shop")
//!         .build()?;
//!
//!     let sandbox = BlockingSandbox::postgres(config)?;
//!     sandbox.prepare()?;
//!     sandbox.rebuild()?; // before every test
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod observability;
pub mod sandbox;
pub mod storage;
pub mod validation;

// Re-export commonly used types and traits
pub use config::{DataSource, SandboxConfig, SandboxSettings};
pub use errors::{Result, SandboxError};
pub use lifecycle::SandboxExtension;
pub use sandbox::{
    BlockingSandbox, PostgresSandboxProvider, PrepareOutcome, SandboxProvider, TemplateGate,
};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
