//! SQL text for every administrative statement.
//!
//! Catalog queries bind the database name as a parameter. DDL cannot, so the
//! DDL builders take names that already passed
//! [`validate_identifier`](crate::validation::validate_identifier) and quote them.

use crate::validation::quote_identifier;

/// Signal every other backend connected to `$1` to terminate.
pub const TERMINATE_SESSIONS: &str = "SELECT pg_terminate_backend(pid) \
     FROM pg_stat_activity \
     WHERE datname = $1 AND pid <> pg_backend_pid()";

/// Look up a database named `$1` that is flagged as a template.
pub const TEMPLATE_EXISTS: &str = "SELECT 1 FROM pg_database WHERE datname = $1 AND datistemplate";

/// Look up any database named `$1`, template or not.
pub const DATABASE_EXISTS: &str = "SELECT 1 FROM pg_database WHERE datname = $1";

pub fn set_template_flag(database: &str, is_template: bool) -> String {
    format!("ALTER DATABASE {} IS_TEMPLATE {}", quote_identifier(database), is_template)
}

pub fn create_from_template(database: &str, template: &str) -> String {
    format!(
        "CREATE DATABASE {} TEMPLATE {}",
        quote_identifier(database),
        quote_identifier(template)
    )
}

pub fn drop_if_exists(database: &str) -> String {
    format!("DROP DATABASE IF EXISTS {}", quote_identifier(database))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_text() {
        assert_eq!(set_template_flag("app", true), "ALTER DATABASE \"app\" IS_TEMPLATE true");
        assert_eq!(set_template_flag("app", false), "ALTER DATABASE \"app\" IS_TEMPLATE false");
        assert_eq!(
            create_from_template("app", "app_tpl"),
            "CREATE DATABASE \"app\" TEMPLATE \"app_tpl\""
        );
        assert_eq!(drop_if_exists("App"), "DROP DATABASE IF EXISTS \"App\"");
    }

    #[test]
    fn test_catalog_queries_are_parameterised() {
        for query in [TERMINATE_SESSIONS, TEMPLATE_EXISTS, DATABASE_EXISTS] {
            assert!(query.contains("datname = $1"));
        }
        assert!(TERMINATE_SESSIONS.contains("pid <> pg_backend_pid()"));
    }
}
