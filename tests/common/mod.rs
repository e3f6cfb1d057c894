//! Common test utilities for integration tests.
//!
//! Provides a Testcontainers-backed PostgreSQL server with a seeded primary
//! database, plus helpers for inspecting databases from the outside.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod test_db;
