//! # Identifier Validation
//!
//! Database names cannot be bound as parameters in PostgreSQL DDL, so every
//! name that ends up inside `CREATE DATABASE`, `DROP DATABASE` or
//! `ALTER DATABASE` is checked against an allow-list grammar first:
//! a letter or underscore followed by letters, digits or underscores.
//!
//! Nothing downstream re-validates; this module is the only injection guard.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

use crate::errors::{Result, SandboxError};

/// Lowest TCP port accepted for the server
pub const MIN_PORT: u32 = 1;
/// Highest TCP port accepted for the server
pub const MAX_PORT: u32 = 65535;

lazy_static! {
    /// Database names: ASCII letter or underscore, then letters, digits, underscores
    static ref SAFE_IDENTIFIER_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Check whether `name` may be embedded into DDL.
pub fn is_safe_identifier(name: &str) -> bool {
    SAFE_IDENTIFIER_REGEX.is_match(name)
}

/// Validate a database identifier, returning it unchanged on success.
///
/// `field` names the setting the value came from and is carried in the error.
pub fn validate_identifier<'a>(name: Option<&'a str>, field: &str) -> Result<&'a str> {
    let name = name.ok_or_else(|| {
        SandboxError::config_field(format!("{} cannot be empty", field), field)
    })?;

    if !is_safe_identifier(name) {
        return Err(SandboxError::config_field(
            format!(
                "{} contains invalid characters. Only alphanumeric characters and \
                 underscores are allowed: {}",
                field, name
            ),
            field,
        ));
    }

    Ok(name)
}

/// Validate a port number and narrow it to `u16`.
pub fn validate_port(port: u32) -> Result<u16> {
    if !(MIN_PORT..=MAX_PORT).contains(&port) {
        return Err(SandboxError::config_field(
            format!("Port must be between {} and {}, got: {}", MIN_PORT, MAX_PORT, port),
            "port",
        ));
    }
    Ok(port as u16)
}

/// `validator` hook for identifier fields in settings structs
pub fn validate_database_name(name: &str) -> std::result::Result<(), ValidationError> {
    if !is_safe_identifier(name) {
        let mut error = ValidationError::new("invalid_database_name");
        error.message = Some(
            "Only alphanumeric characters and underscores are allowed, starting with a letter \
             or underscore"
                .into(),
        );
        return Err(error);
    }
    Ok(())
}

/// Quote an already validated identifier for DDL.
///
/// Quoting keeps the name case-sensitive so the catalog lookups, which match
/// `datname` exactly, see the same name the DDL created.
pub(crate) fn quote_identifier(name: &str) -> String {
    debug_assert!(is_safe_identifier(name));
    format!("\"{}\"", name)
}
