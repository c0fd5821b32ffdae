//! Base user identity and credential lifecycle
//!
//! [`BaseUser`] owns the `users` table row: identity, credentials, and the
//! plain commit/destroy lifecycle. The RBAC extension composes around it
//! rather than inheriting from it.

use chrono::NaiveDateTime;
use serde_json::json;
use tracing::{debug, warn};

use super::password::{hash_password, verify_password};
use crate::storage::datastore::{DataStore, Row, row_i64, row_str};
use crate::utils::error::{Result, StoreError};

/// Name of the user table
pub const USERS_TABLE: &str = "users";

const USER_COLUMNS: [&str; 5] = ["id", "username", "password", "email", "creationDate"];

/// An authenticated-user identity persisted in the `users` table
#[derive(Debug, Clone, Default)]
pub struct BaseUser {
    id: Option<i64>,
    username: String,
    email: String,
    password_hash: String,
    created_at: Option<NaiveDateTime>,
}

impl BaseUser {
    /// Create a fresh, unsaved user
    pub fn new() -> Self {
        Self::default()
    }

    /// Database identifier, `None` until the first successful commit
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Email address
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Stored password hash
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Creation timestamp as recorded by the store
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_at
    }

    /// Set the username
    pub fn set_username(&mut self, username: &str) {
        self.username = username.to_string();
    }

    /// Set the email address
    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
    }

    /// Hash and set the password
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.password_hash = hash_password(password)?;
        Ok(())
    }

    fn hydrate(&mut self, row: &Row) -> Result<()> {
        self.id = Some(row_i64(row, "id")?);
        self.username = row_str(row, "username")?.to_string();
        self.password_hash = row_str(row, "password")?.to_string();
        self.email = row_str(row, "email")?.to_string();
        self.created_at = row
            .get("creationDate")
            .and_then(|v| v.as_str())
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok());
        Ok(())
    }

    /// Load the user row by id
    ///
    /// Returns `Ok(false)` when no such user exists.
    pub async fn login_by_id(&mut self, store: &dyn DataStore, id: i64) -> Result<bool> {
        let rows = store
            .fetch(USERS_TABLE, &USER_COLUMNS, &[("id", json!(id))])
            .await?;
        let Some(row) = rows.first() else {
            debug!(id, "login by id failed, no such user");
            return Ok(false);
        };
        self.hydrate(row)?;
        Ok(true)
    }

    /// Authenticate by access identifier (username or email) and password
    ///
    /// Returns `Ok(false)` for unknown identifiers and wrong passwords alike;
    /// `Err` is reserved for storage and crypto failures.
    pub async fn login(
        &mut self,
        store: &dyn DataStore,
        identifier: &str,
        password: &str,
    ) -> Result<bool> {
        let mut rows = store
            .fetch(USERS_TABLE, &USER_COLUMNS, &[("username", json!(identifier))])
            .await?;
        if rows.is_empty() {
            rows = store
                .fetch(USERS_TABLE, &USER_COLUMNS, &[("email", json!(identifier))])
                .await?;
        }
        let Some(row) = rows.first() else {
            debug!(identifier, "login failed, unknown identifier");
            return Ok(false);
        };

        if !verify_password(password, row_str(row, "password")?)? {
            debug!(identifier, "login failed, wrong password");
            return Ok(false);
        }

        self.hydrate(row)?;
        Ok(true)
    }

    /// Insert the user row, or update it when already assigned an id
    pub async fn commit(&mut self, store: &dyn DataStore) -> Result<()> {
        match self.id {
            None => {
                store
                    .insert(
                        USERS_TABLE,
                        &[
                            ("username", json!(self.username)),
                            ("password", json!(self.password_hash)),
                            ("email", json!(self.email)),
                        ],
                    )
                    .await?;
                self.id = Some(store.last_insert_id(USERS_TABLE).await?);
                debug!(username = %self.username, id = self.id, "user created");
            }
            Some(id) => {
                store
                    .update(
                        USERS_TABLE,
                        &[("id", json!(id))],
                        &[
                            ("username", json!(self.username)),
                            ("password", json!(self.password_hash)),
                            ("email", json!(self.email)),
                        ],
                    )
                    .await?;
                debug!(username = %self.username, id, "user updated");
            }
        }
        Ok(())
    }

    /// Delete the user row and reset the id to unassigned
    pub async fn destroy(&mut self, store: &dyn DataStore) -> Result<()> {
        let Some(id) = self.id.take() else {
            return Err(StoreError::validation("user was never committed"));
        };
        let removed = store.delete(USERS_TABLE, &[("id", json!(id))]).await?;
        if removed == 0 {
            warn!(id, "user row already gone");
            return Err(StoreError::not_found(format!("user {id} does not exist")));
        }
        Ok(())
    }
}
