//! NexGen Database: SurrealDB connection management and repository
//! implementations for the registry and tenant stores.
//!
//! This crate provides:
//! - One connection per store ([`DbManager`], [`DbConfig`], [`Store`])
//! - Schema initialization, migrations and plan seeding
//!   ([`run_registry_migrations`], [`run_tenant_migrations`])
//! - Repository implementations of the `nexgen-core` traits
//! - Error types ([`DbError`])

mod connection;
mod error;
mod password;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager, Store};
pub use error::DbError;
pub use schema::{
    registry_schema_v1, registry_schema_v2, run_registry_migrations, run_tenant_migrations,
    tenant_schema_v1,
};
