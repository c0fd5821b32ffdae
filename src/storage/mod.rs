//! Storage layer
//!
//! This module provides the generic table-level persistence contract the
//! RBAC entities are written against, plus its backends.

pub mod datastore;
pub mod memory;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;

pub use datastore::{ColumnDef, ColumnType, DataStore, Row, TableDef};
pub use memory::MemoryStore;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::SqlStore;
