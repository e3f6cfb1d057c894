//! # Observability
//!
//! Structured logging for sandbox operations. Lifecycle calls run inside
//! `sandbox_operation` spans; the binary installs the subscriber, libraries
//! embedding the crate bring their own.

pub mod logging;

pub use logging::init_logging;
