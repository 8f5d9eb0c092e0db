//! Database Module
//!
//! Resilient SurrealDB connection management, schema and repositories.
//! Every data access in the system goes through [`ConnectionManager`];
//! no component holds its own connection.

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::{ConnectionError, ConnectionManager, ConnectionSettings};
