//! Configuration for the role store
//!
//! This module holds the configuration structs for the database connection
//! and the RBAC defaults.

use serde::{Deserialize, Serialize};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("Connection pool must allow at least one connection".to_string());
        }
        Ok(())
    }
}

/// RBAC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Default role name for new users
    #[serde(default = "default_role")]
    pub default_role: String,
    /// Roles granted administrative access
    #[serde(default = "default_admin_roles")]
    pub admin_roles: Vec<String>,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            default_role: default_role(),
            admin_roles: default_admin_roles(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://data/rolestore.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    10
}

fn default_role() -> String {
    "user".to_string()
}

fn default_admin_roles() -> Vec<String> {
    vec!["admin".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_defaults() {
        let config = DatabaseConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.url.starts_with("sqlite://"));
    }

    #[test]
    fn test_database_config_rejects_empty_url() {
        let config = DatabaseConfig {
            url: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rbac_config_defaults() {
        let config = RbacConfig::default();
        assert_eq!(config.default_role, "user");
        assert!(config.admin_roles.contains(&"admin".to_string()));
    }
}
