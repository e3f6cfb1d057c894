//! # Structured Logging
//!
//! Span macros and subscriber setup for the tracing ecosystem.

/// Create a tracing span for a sandbox lifecycle operation.
///
/// Every span carries the operation name and a fresh `operation_id`; extra
/// fields are passed straight through:
///
/// ```rust,ignore
/// let span = sandbox_span!("rebuild", primary = %"shop");
/// ```
#[macro_export]
macro_rules! sandbox_span {
    ($operation:expr) => {
        tracing::debug_span!(
            "sandbox_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "sandbox_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::errors::{Result, SandboxError};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Returns `Ok(false)` when another
/// subscriber was installed first (test harnesses often do this).
pub fn init_logging(level: &str, json: bool) -> Result<bool> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(level),
    }
    .map_err(|e| SandboxError::config_field(format!("Invalid log filter: {}", e), "log_level"))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry.with(fmt::layer().json().with_target(true)).try_init().is_ok()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init().is_ok()
    };

    if installed {
        tracing::debug!(level = %level, json, "Logging initialised");
    }
    Ok(installed)
}
