//! # TaskFlow Shared Library
//!
//! This crate contains the in-memory data store and the business logic shared by
//! the TaskFlow server and any transport layered on top of it.
//!
//! ## Module Organization
//!
//! - `models`: Entity records and create/update commands
//! - `db`: The `Database` entity store and its secondary indexes
//! - `graph`: Task dependency cycle detection
//! - `mentions`: `@username` extraction from comment text
//! - `events`: Typed publish/subscribe for live updates
//! - `auth`: Session registry and authorization checks
//! - `config`: Store configuration
//! - `error`: The store error taxonomy

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod graph;
pub mod mentions;
pub mod models;

pub use config::StoreConfig;
pub use db::{Database, SharedDatabase};
pub use error::{StoreError, StoreResult};

/// Current version of the TaskFlow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
