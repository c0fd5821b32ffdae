//! Schema bootstrap and user-type registration
//!
//! Declares the three persisted table shapes and wires the role-bearing
//! user type into the user registry the host system constructs users
//! through. Table creation is idempotent; `reset` drops everything for
//! development and test runs.

use tracing::info;

use super::role::{ROLES_TABLE, Role};
use super::types::{
    PermissionRegistry, USER_MANAGEMENT, USER_MANAGEMENT_ACC_ADD, USER_MANAGEMENT_ACC_DEL,
    USER_MANAGEMENT_ACC_EDIT, USER_MANAGEMENT_ACC_ROLES, USER_MANAGEMENT_ACC_VIEW,
};
use super::user::{RELATIONS_TABLE, RoleBasedUser};
use crate::auth::user::USERS_TABLE;
use crate::config::RbacConfig;
use crate::storage::datastore::{ColumnDef, ColumnType, DataStore, TableDef};
use crate::utils::error::{Result, StoreError};

fn users_table() -> TableDef {
    TableDef::new(
        USERS_TABLE,
        vec![
            ColumnDef::new("id", ColumnType::Integer)
                .primary_key()
                .auto_increment(),
            ColumnDef::new("username", ColumnType::VarChar(35)),
            ColumnDef::new("password", ColumnType::VarChar(512)),
            ColumnDef::new("email", ColumnType::VarChar(64)),
            ColumnDef::new("creationDate", ColumnType::Timestamp)
                .default_expr("CURRENT_TIMESTAMP"),
        ],
    )
}

fn roles_table() -> TableDef {
    TableDef::new(
        ROLES_TABLE,
        vec![
            ColumnDef::new("id", ColumnType::Integer)
                .primary_key()
                .auto_increment(),
            ColumnDef::new("name", ColumnType::VarChar(35)),
            ColumnDef::new("permissions", ColumnType::Text),
        ],
    )
}

fn relations_table() -> TableDef {
    TableDef::new(
        RELATIONS_TABLE,
        vec![
            ColumnDef::new("usr_id", ColumnType::Integer),
            ColumnDef::new("role_id", ColumnType::Integer),
        ],
    )
}

/// The three persisted table shapes, users first
pub fn table_definitions() -> Vec<TableDef> {
    vec![users_table(), roles_table(), relations_table()]
}

/// Create all RBAC tables if they do not exist
pub async fn initialize(store: &dyn DataStore) -> Result<()> {
    info!("initializing rbac schema");
    for def in table_definitions() {
        store.create_table(&def).await?;
    }
    Ok(())
}

/// Drop and recreate all RBAC tables, discarding their contents
pub async fn reset(store: &dyn DataStore) -> Result<()> {
    info!("resetting rbac schema");
    for def in table_definitions() {
        store.drop_table(&def.name).await?;
    }
    initialize(store).await
}

type UserFactory = Box<dyn Fn() -> RoleBasedUser + Send + Sync>;

/// Registry of the active user implementation
///
/// The surrounding user management constructs users exclusively through
/// this registry, so registering a factory here decides which user type
/// every authentication flow yields.
pub struct UserRegistry {
    config: RbacConfig,
    factory: Option<UserFactory>,
}

impl UserRegistry {
    /// Create an empty registry with the given RBAC defaults
    pub fn new(config: RbacConfig) -> Self {
        Self {
            config,
            factory: None,
        }
    }

    /// RBAC defaults this registry was created with
    pub fn config(&self) -> &RbacConfig {
        &self.config
    }

    /// Register the user factory all flows construct users through
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> RoleBasedUser + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(factory));
    }

    /// Construct a fresh, unsaved user
    pub fn new_user(&self) -> Result<RoleBasedUser> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| StoreError::config("no user implementation registered"))?;
        Ok(factory())
    }

    /// Load a user by id, or `None` when no such user exists
    pub async fn user_by_id(
        &self,
        store: &dyn DataStore,
        id: i64,
    ) -> Result<Option<RoleBasedUser>> {
        let mut user = self.new_user()?;
        if user.login_by_id(store, id).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new(RbacConfig::default())
    }
}

/// Register [`RoleBasedUser`] as the active user implementation
pub fn register_role_based_users(registry: &mut UserRegistry) {
    registry.register(RoleBasedUser::new);
}

/// Create a demo administrator with the full built-in permission catalog
///
/// Development aid for fresh installations; not part of the production
/// contract.
pub async fn seed_demo_admin(
    store: &dyn DataStore,
    registry: &UserRegistry,
) -> Result<RoleBasedUser> {
    let role_name = registry
        .config()
        .admin_roles
        .first()
        .cloned()
        .unwrap_or_else(|| "admin".to_string());
    info!(role = %role_name, "seeding demo admin user");

    let permissions = PermissionRegistry::builtin();
    let admin_role = Role::new(
        role_name,
        [
            &*USER_MANAGEMENT,
            &*USER_MANAGEMENT_ACC_ADD,
            &*USER_MANAGEMENT_ACC_VIEW,
            &*USER_MANAGEMENT_ACC_DEL,
            &*USER_MANAGEMENT_ACC_EDIT,
            &*USER_MANAGEMENT_ACC_ROLES,
        ]
        .into_iter()
        .map(|p| permissions.resolve(p.name()))
        .collect(),
    );

    let mut user = registry.new_user()?;
    user.set_username("test");
    user.set_email("test@email.com");
    user.set_password("test")?;
    user.add_role(admin_role);
    user.commit(store).await?;
    Ok(user)
}
