//! Role-based access control
//!
//! The RBAC entity model and its persistence lifecycle: permissions, roles,
//! the role-bearing user, and the schema bootstrap.

pub mod registrar;
pub mod role;
pub mod types;
pub mod user;

pub use registrar::{
    UserRegistry, initialize, register_role_based_users, reset, seed_demo_admin, table_definitions,
};
pub use role::{ROLES_TABLE, Role};
pub use types::{
    Permission, PermissionRegistry, USER_MANAGEMENT, USER_MANAGEMENT_ACC_ADD,
    USER_MANAGEMENT_ACC_DEL, USER_MANAGEMENT_ACC_EDIT, USER_MANAGEMENT_ACC_ROLES,
    USER_MANAGEMENT_ACC_VIEW,
};
pub use user::{RELATIONS_TABLE, RoleBasedUser};
