//! # Error Handling
//!
//! Error types for sandbox provisioning, built with `thiserror`.
//!
//! Callers get exactly two families of failure: configuration errors, raised
//! synchronously while a [`SandboxConfig`](crate::config::SandboxConfig) is
//! being built and never worth retrying, and runtime errors raised while
//! talking to PostgreSQL during `prepare` or `rebuild`. Every runtime variant
//! carries the underlying `sqlx::Error` as its source.

/// Custom result type for sandbox operations
pub type Result<T> = std::result::Result<T, SandboxError>;

/// Main error type for sandbox operations
#[derive(thiserror::Error, Debug)]
pub enum SandboxError {
    /// Invalid identifier, port, URL or settings
    #[error("Configuration error: {message}")]
    Config { message: String, field: Option<String> },

    /// The administrative connection could not be opened
    #[error("Connection error: {context}")]
    Connection {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// Template lookup or construction failed
    #[error("Template preparation failed: {context}")]
    Preparation {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// Session termination, drop or recreate failed during a rebuild
    #[error("Sandbox operation failed: {context}")]
    Operation {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// A lifecycle hook ran before any provider was registered
    #[error("No PostgreSQL database provider available")]
    NoProvider,

    /// The blocking facade could not start its runtime
    #[error("Runtime error: {context}")]
    Runtime {
        #[source]
        source: std::io::Error,
        context: String,
    },
}

impl SandboxError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error naming the offending field
    pub fn config_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Connection { source, context: context.into() }
    }

    /// Create a preparation error
    pub fn preparation<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Preparation { source, context: context.into() }
    }

    /// Create an operation error
    pub fn operation<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Operation { source, context: context.into() }
    }

    /// The field a configuration error refers to, if known
    pub fn field(&self) -> Option<&str> {
        match self {
            SandboxError::Config { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// True for errors that must be fixed in setup rather than retried
    pub fn is_configuration(&self) -> bool {
        matches!(self, SandboxError::Config { .. } | SandboxError::NoProvider)
    }

    /// Check if the failed call is safe and worthwhile to repeat
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SandboxError::Connection { .. }
                | SandboxError::Preparation { .. }
                | SandboxError::Operation { .. }
        )
    }
}

impl From<config::ConfigError> for SandboxError {
    fn from(error: config::ConfigError) -> Self {
        Self::config(format!("Settings loading failed: {}", error))
    }
}

impl From<validator::ValidationErrors> for SandboxError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let message = field_errors
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        match field_errors.keys().next() {
            Some(field) if field_errors.len() == 1 => Self::config_field(
                format!("Validation failed: {}", message),
                field.to_string(),
            ),
            _ => Self::config(format!("Validation failed: {}", message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creation() {
        let error = SandboxError::config("Test configuration error");
        assert!(matches!(error, SandboxError::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: Test configuration error");
        assert!(error.field().is_none());
    }

    #[test]
    fn test_config_field_error() {
        let error = SandboxError::config_field("bad name", "template_database");
        assert_eq!(error.field(), Some("template_database"));
        assert!(error.is_configuration());
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_runtime_errors_are_retryable() {
        let error = SandboxError::connection(sqlx::Error::PoolClosed, "connect");
        assert!(error.is_retryable());
        assert!(!error.is_configuration());

        let error = SandboxError::preparation(sqlx::Error::RowNotFound, "lookup");
        assert!(error.is_retryable());
        assert_eq!(error.to_string(), "Template preparation failed: lookup");

        let error = SandboxError::operation(sqlx::Error::PoolClosed, "drop");
        assert!(error.is_retryable());
        assert_eq!(error.to_string(), "Sandbox operation failed: drop");
    }

    #[test]
    fn test_runtime_errors_keep_source() {
        use std::error::Error as _;

        let error = SandboxError::connection(sqlx::Error::PoolClosed, "connect");
        let source = error.source().expect("source should be kept");
        assert!(source.downcast_ref::<sqlx::Error>().is_some());
    }

    #[test]
    fn test_no_provider_error() {
        let error = SandboxError::NoProvider;
        assert!(error.is_configuration());
        assert_eq!(error.to_string(), "No PostgreSQL database provider available");
    }

    #[test]
    fn test_validation_errors_conversion() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("range");
        err.message = Some("Port must be between 1 and 65535".into());
        errors.add("port", err);

        let error: SandboxError = errors.into();
        assert!(error.is_configuration());
        assert_eq!(error.field(), Some("port"));
        assert!(error.to_string().contains("Port must be between 1 and 65535"));
    }
}
