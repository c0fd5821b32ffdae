//! Role entity and its persistence lifecycle
//!
//! A role is a named bundle of permissions persisted in the `users_roles`
//! table. On the wire the permission set is a JSON array of permission
//! names; descriptions are deliberately not carried, so a role rehydrated
//! from storage holds bare permissions.

use serde_json::json;
use tracing::debug;

use super::types::Permission;
use crate::storage::datastore::DataStore;
use crate::utils::error::{Result, StoreError};

/// Name of the role table
pub const ROLES_TABLE: &str = "users_roles";

/// A named, persisted bundle of permissions assignable to users
#[derive(Debug, Clone)]
pub struct Role {
    id: Option<i64>,
    name: String,
    permissions: Vec<Permission>,
}

impl Role {
    /// Create a fresh, unsaved role
    pub fn new(name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            id: None,
            name: name.into(),
            permissions,
        }
    }

    /// Rebuild a role from its stored name and serialized permission set
    ///
    /// The payload must be a JSON array of permission names; anything else
    /// is a serialization error, never a silently empty set.
    pub fn from_stored(name: &str, permissions_json: &str) -> Result<Self> {
        let names: Vec<String> = serde_json::from_str(permissions_json)?;
        Ok(Self {
            id: None,
            name: name.to_string(),
            permissions: names.into_iter().map(Permission::named).collect(),
        })
    }

    /// Database identifier, `None` until the first successful commit
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Adopt a database identifier, e.g. from a relation row
    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    /// Role name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permissions granted by this role, in insertion order
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Append a permission to the role
    pub fn add_permission(&mut self, permission: Permission) {
        self.permissions.push(permission);
    }

    /// The wire form of the permission set: a JSON array of names
    pub fn serialized_permissions(&self) -> Result<String> {
        let names: Vec<&str> = self.permissions.iter().map(Permission::name).collect();
        Ok(serde_json::to_string(&names)?)
    }

    /// Insert the role row, or update its permissions when already assigned
    ///
    /// A first commit adopts the database-assigned identifier; later commits
    /// rewrite only the `permissions` column and leave the name untouched.
    pub async fn commit(&mut self, store: &dyn DataStore) -> Result<()> {
        let payload = self.serialized_permissions()?;
        match self.id {
            None => {
                store
                    .insert(
                        ROLES_TABLE,
                        &[("name", json!(self.name)), ("permissions", json!(payload))],
                    )
                    .await?;
                self.id = Some(store.last_insert_id(ROLES_TABLE).await?);
                debug!(role = %self.name, id = self.id, "role created");
            }
            Some(id) => {
                store
                    .update(
                        ROLES_TABLE,
                        &[("id", json!(id))],
                        &[("permissions", json!(payload))],
                    )
                    .await?;
                debug!(role = %self.name, id, "role permissions updated");
            }
        }
        Ok(())
    }

    /// Delete the role row and reset the id to unassigned
    ///
    /// The id is taken out of the object before the delete is issued, so a
    /// second destroy on the same object fails without touching storage.
    pub async fn destroy(&mut self, store: &dyn DataStore) -> Result<()> {
        let Some(id) = self.id.take() else {
            return Err(StoreError::validation("role was never committed"));
        };
        let removed = store.delete(ROLES_TABLE, &[("id", json!(id))]).await?;
        if removed == 0 {
            return Err(StoreError::not_found(format!("role {id} does not exist")));
        }
        debug!(role = %self.name, id, "role destroyed");
        Ok(())
    }
}
