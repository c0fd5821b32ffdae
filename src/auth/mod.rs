//! Authentication and authorization
//!
//! This module provides the base user credential lifecycle and the RBAC
//! extension built on top of it.

pub mod password;
pub mod rbac;
pub mod user;

pub use user::{BaseUser, USERS_TABLE};
