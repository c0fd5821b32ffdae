//! Role-bearing user entity
//!
//! [`RoleBasedUser`] composes the base credential lifecycle with a role
//! list resolved from the `users_roles_relations` table. Login resolves the
//! relation rows into full [`Role`] objects; commit and destroy cascade
//! across the role and relation tables.
//!
//! The cascades are sequential, single-writer, and not atomic: a failing
//! step stops the cascade but leaves earlier writes in place.

use serde_json::json;
use tracing::{debug, info, warn};

use super::role::{ROLES_TABLE, Role};
use super::types::Permission;
use crate::auth::user::BaseUser;
use crate::storage::datastore::{DataStore, row_i64, row_str};
use crate::utils::error::{Result, StoreError};

/// Name of the user-to-role relation table
pub const RELATIONS_TABLE: &str = "users_roles_relations";

/// A user entity carrying its resolved roles
#[derive(Debug, Clone, Default)]
pub struct RoleBasedUser {
    base: BaseUser,
    roles: Vec<Role>,
}

impl RoleBasedUser {
    /// Create a fresh, unsaved user with no roles
    pub fn new() -> Self {
        Self::default()
    }

    /// The composed base identity
    pub fn base(&self) -> &BaseUser {
        &self.base
    }

    /// Database identifier, `None` until the first successful commit
    pub fn id(&self) -> Option<i64> {
        self.base.id()
    }

    /// Username
    pub fn username(&self) -> &str {
        self.base.username()
    }

    /// Email address
    pub fn email(&self) -> &str {
        self.base.email()
    }

    /// Set the username
    pub fn set_username(&mut self, username: &str) {
        self.base.set_username(username);
    }

    /// Set the email address
    pub fn set_email(&mut self, email: &str) {
        self.base.set_email(email);
    }

    /// Hash and set the password
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.base.set_password(password)
    }

    /// Attach a role in memory; nothing is persisted until `commit`
    pub fn add_role(&mut self, role: Role) {
        self.roles.push(role);
    }

    /// Roles held by this user, as of the last login or commit
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The resolved permission set across all roles, deduplicated by name
    ///
    /// This is the read surface an access-control decision point consumes.
    pub fn resolved_permissions(&self) -> Vec<&Permission> {
        let mut seen = std::collections::HashSet::new();
        self.roles
            .iter()
            .flat_map(|role| role.permissions())
            .filter(|permission| seen.insert(permission.name()))
            .collect()
    }

    /// Resolve the relation rows for this user into full role objects
    ///
    /// Two-level lookup, one role row fetch per relation. A relation whose
    /// role row is gone is a data-integrity gap: it is logged and skipped.
    /// A malformed permission payload fails the whole load.
    async fn load_roles(&mut self, store: &dyn DataStore) -> Result<()> {
        let usr_id = self
            .base
            .id()
            .ok_or_else(|| StoreError::validation("cannot load roles without a user id"))?;

        let relations = store
            .fetch(
                RELATIONS_TABLE,
                &["role_id", "usr_id"],
                &[("usr_id", json!(usr_id))],
            )
            .await?;

        for relation in &relations {
            let role_id = row_i64(relation, "role_id")?;
            let rows = store
                .fetch(
                    ROLES_TABLE,
                    &["id", "name", "permissions"],
                    &[("id", json!(role_id))],
                )
                .await?;
            let Some(row) = rows.first() else {
                warn!(usr_id, role_id, "relation references a missing role, skipping");
                continue;
            };

            let mut role = Role::from_stored(row_str(row, "name")?, row_str(row, "permissions")?)?;
            role.set_id(role_id);
            self.roles.push(role);
        }

        debug!(usr_id, roles = self.roles.len(), "roles resolved");
        Ok(())
    }

    /// Load the user by id and resolve its roles
    ///
    /// Role resolution is awaited: its failure surfaces as an error, distinct
    /// from the `Ok(false)` of an unknown id.
    pub async fn login_by_id(&mut self, store: &dyn DataStore, id: i64) -> Result<bool> {
        if !self.base.login_by_id(store, id).await? {
            return Ok(false);
        }
        self.load_roles(store).await?;
        info!(username = %self.base.username(), id, "user logged in by id");
        Ok(true)
    }

    /// Authenticate by identifier and password, then resolve roles
    ///
    /// Returns `Ok(false)` only for failed authentication; a failed role
    /// load after successful authentication is an error in its own right.
    pub async fn login(
        &mut self,
        store: &dyn DataStore,
        identifier: &str,
        password: &str,
    ) -> Result<bool> {
        if !self.base.login(store, identifier, password).await? {
            return Ok(false);
        }
        self.load_roles(store).await?;
        info!(username = %self.base.username(), "user logged in");
        Ok(true)
    }

    /// Commit the user, then cascade over the attached roles
    ///
    /// The base commit runs first; when it fails, no role or relation write
    /// is issued. Each attached role is then committed and its relation row
    /// inserted unless already present, stopping at the first failure.
    pub async fn commit(&mut self, store: &dyn DataStore) -> Result<()> {
        self.base.commit(store).await?;
        let usr_id = self
            .base
            .id()
            .ok_or_else(|| StoreError::validation("user id missing after commit"))?;

        for role in &mut self.roles {
            role.commit(store).await?;
            let role_id = role
                .id()
                .ok_or_else(|| StoreError::validation("role id missing after commit"))?;

            let existing = store
                .fetch(
                    RELATIONS_TABLE,
                    &["role_id"],
                    &[("usr_id", json!(usr_id)), ("role_id", json!(role_id))],
                )
                .await?;
            if existing.is_empty() {
                store
                    .insert(
                        RELATIONS_TABLE,
                        &[("role_id", json!(role_id)), ("usr_id", json!(usr_id))],
                    )
                    .await?;
            }
        }

        debug!(usr_id, roles = self.roles.len(), "user committed");
        Ok(())
    }

    /// Remove this user's relation rows, then destroy the base user
    ///
    /// One relation delete per held role. Role rows themselves are left in
    /// place; the role catalog outlives its members.
    pub async fn destroy(&mut self, store: &dyn DataStore) -> Result<()> {
        if let Some(usr_id) = self.base.id() {
            for role in &self.roles {
                if let Some(role_id) = role.id() {
                    store
                        .delete(
                            RELATIONS_TABLE,
                            &[("usr_id", json!(usr_id)), ("role_id", json!(role_id))],
                        )
                        .await?;
                }
            }
        }
        self.base.destroy(store).await
    }
}
