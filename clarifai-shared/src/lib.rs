//! # Clarifai Shared Library
//!
//! Shared types and business logic for the Clarifai task tracker: database
//! models and CRUD, authentication primitives, file storage backends, and
//! the business-goal verification shim.
//!
//! ## Module Organization
//!
//! - `models`: database models (users, tasks, files)
//! - `auth`: password hashing, session tokens, request auth context
//! - `db`: connection pool and migrations
//! - `storage`: local-disk and object-store file backends
//! - `verify`: clarity/feasibility assessment shim

pub mod auth;
pub mod db;
pub mod models;
pub mod storage;
pub mod verify;

/// Current version of the Clarifai shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
