//! Infrastructure layer: PostgreSQL repositories and connection management.

pub mod database;

pub use database::manager::DatabaseManager;
pub use database::postgres::{PostgresDispatchRepository, PostgresUserRepository};
