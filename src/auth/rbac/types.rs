//! Permission type and the built-in permission catalog

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An atomic named capability used for access decisions
///
/// The name is the canonical identity: two permissions with equal names are
/// interchangeable for authorization purposes, whatever their descriptions
/// say. Descriptions are display metadata and are not persisted with roles.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Permission {
    name: String,
    description: String,
}

impl Permission {
    /// Create a permission with a description
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Create a permission carrying only a name
    ///
    /// Used when rehydrating a role from storage, where the wire form keeps
    /// names only.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    /// Permission name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permission description, possibly empty
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for Permission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Access to the user management area
pub static USER_MANAGEMENT: Lazy<Permission> = Lazy::new(|| {
    Permission::new("USER_MANAGEMENT", "Access the user management area")
});

/// Create user accounts
pub static USER_MANAGEMENT_ACC_ADD: Lazy<Permission> = Lazy::new(|| {
    Permission::new("USER_MANAGEMENT.ACCOUNT.ADD", "Create user accounts")
});

/// View user accounts
pub static USER_MANAGEMENT_ACC_VIEW: Lazy<Permission> = Lazy::new(|| {
    Permission::new("USER_MANAGEMENT.ACCOUNT.VIEW", "View user accounts")
});

/// Edit user accounts
pub static USER_MANAGEMENT_ACC_EDIT: Lazy<Permission> = Lazy::new(|| {
    Permission::new("USER_MANAGEMENT.ACCOUNT.EDIT", "Edit user accounts")
});

/// Delete user accounts
pub static USER_MANAGEMENT_ACC_DEL: Lazy<Permission> = Lazy::new(|| {
    Permission::new("USER_MANAGEMENT.ACCOUNT.DELETE", "Delete user accounts")
});

/// Manage role assignments of user accounts
pub static USER_MANAGEMENT_ACC_ROLES: Lazy<Permission> = Lazy::new(|| {
    Permission::new(
        "USER_MANAGEMENT.ACCOUNT.ROLES",
        "Manage role assignments of user accounts",
    )
});

/// Immutable name-to-permission registry
///
/// Role-authoring code resolves stored names against a registry instead of a
/// mutable global, so well-known permissions keep their descriptions across
/// a persistence round trip.
#[derive(Debug, Clone)]
pub struct PermissionRegistry {
    permissions: HashMap<String, Permission>,
}

impl PermissionRegistry {
    /// Registry holding the built-in catalog
    pub fn builtin() -> Self {
        Self::with_permissions([
            USER_MANAGEMENT.clone(),
            USER_MANAGEMENT_ACC_ADD.clone(),
            USER_MANAGEMENT_ACC_VIEW.clone(),
            USER_MANAGEMENT_ACC_EDIT.clone(),
            USER_MANAGEMENT_ACC_DEL.clone(),
            USER_MANAGEMENT_ACC_ROLES.clone(),
        ])
    }

    /// Registry holding the given permissions
    pub fn with_permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            permissions: permissions
                .into_iter()
                .map(|p| (p.name().to_string(), p))
                .collect(),
        }
    }

    /// Look up a permission by name
    pub fn get(&self, name: &str) -> Option<&Permission> {
        self.permissions.get(name)
    }

    /// Resolve a stored name to a permission
    ///
    /// Unknown names yield a bare permission with no description.
    pub fn resolve(&self, name: &str) -> Permission {
        self.get(name).cloned().unwrap_or_else(|| Permission::named(name))
    }

    /// Number of registered permissions
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}
