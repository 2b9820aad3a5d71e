//! # Planboard Shared Library
//!
//! Domain models, SQL access, and authentication primitives used by the
//! Planboard API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, JWT tokens, one-time tokens, role checks
//! - `db`: Connection pool and migrations
//! - `pagination`: List parameters and page metadata shared by list endpoints

pub mod auth;
pub mod db;
pub mod models;
pub mod pagination;

/// Current version of the Planboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
