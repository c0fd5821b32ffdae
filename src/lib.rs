//! # rolestore
//!
//! A role-based access control user store. Users hold zero or more roles,
//! each role carries a named permission set, and the resolved
//! `(user, roles, permissions)` graph is handed to whatever access-control
//! decision point consumes it.
//!
//! Persistence goes through a narrow table-level [`storage::DataStore`]
//! contract with an in-memory backend for development and tests and a
//! sea-orm backend for SQLite/PostgreSQL.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rolestore::{MemoryStore, Role, RoleBasedUser, USER_MANAGEMENT};
//! use rolestore::auth::rbac;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     rbac::initialize(&store).await?;
//!
//!     let mut user = RoleBasedUser::new();
//!     user.set_username("alice");
//!     user.set_email("alice@example.com");
//!     user.set_password("correct horse")?;
//!     user.add_role(Role::new("admin", vec![USER_MANAGEMENT.clone()]));
//!     user.commit(&store).await?;
//!
//!     let mut session = RoleBasedUser::new();
//!     if session.login(&store, "alice", "correct horse").await? {
//!         for permission in session.resolved_permissions() {
//!             println!("{permission}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod storage;
pub mod utils;

// Re-export main types
pub use auth::BaseUser;
pub use auth::rbac::{
    Permission, PermissionRegistry, Role, RoleBasedUser, USER_MANAGEMENT,
    USER_MANAGEMENT_ACC_ADD, USER_MANAGEMENT_ACC_DEL, USER_MANAGEMENT_ACC_EDIT,
    USER_MANAGEMENT_ACC_ROLES, USER_MANAGEMENT_ACC_VIEW, UserRegistry,
};
pub use config::{DatabaseConfig, RbacConfig};
pub use storage::{DataStore, MemoryStore};
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use storage::SqlStore;
pub use utils::error::{Result, StoreError};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(NAME, "rolestore");
    }
}
