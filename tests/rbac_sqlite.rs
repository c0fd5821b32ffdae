//! End-to-end RBAC lifecycle against the sea-orm SQLite backend

#![cfg(feature = "sqlite")]

use rolestore::auth::rbac::{self, Role, RoleBasedUser};
use rolestore::storage::DataStore;
use rolestore::{DatabaseConfig, SqlStore, USER_MANAGEMENT, USER_MANAGEMENT_ACC_ADD};
use serde_json::json;

async fn sqlite_store() -> SqlStore {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    // A single pooled connection keeps every statement on the same
    // in-memory database.
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        connection_timeout: 5,
    };
    let store = SqlStore::connect(&config).await.unwrap();
    rbac::initialize(&store).await.unwrap();
    store
}

#[tokio::test]
async fn role_lifecycle_against_sqlite() {
    let store = sqlite_store().await;

    let mut role = Role::new(
        "admin",
        vec![USER_MANAGEMENT.clone(), USER_MANAGEMENT_ACC_ADD.clone()],
    );
    role.commit(&store).await.unwrap();
    let id = role.id().unwrap();

    let rows = store
        .fetch(
            rbac::ROLES_TABLE,
            &["id", "name", "permissions"],
            &[("id", json!(id))],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("admin"));
    assert_eq!(
        rows[0]["permissions"],
        json!("[\"USER_MANAGEMENT\",\"USER_MANAGEMENT.ACCOUNT.ADD\"]")
    );

    role.destroy(&store).await.unwrap();
    assert_eq!(role.id(), None);
    let rows = store
        .fetch(rbac::ROLES_TABLE, &["id"], &[("id", json!(id))])
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn misspelled_condition_column_is_rejected() {
    let store = sqlite_store().await;

    let result = store
        .fetch(rbac::ROLES_TABLE, &["id"], &[("nmae", json!("admin"))])
        .await;
    assert!(result.is_err());

    let result = store
        .delete(rbac::ROLES_TABLE, &[("nmae", json!("admin"))])
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn user_lifecycle_against_sqlite() {
    let store = sqlite_store().await;

    let mut user = RoleBasedUser::new();
    user.set_username("test");
    user.set_email("test@email.com");
    user.set_password("test").unwrap();
    user.add_role(Role::new("admin", vec![USER_MANAGEMENT.clone()]));
    user.commit(&store).await.unwrap();
    let user_id = user.id().unwrap();

    let mut session = RoleBasedUser::new();
    assert!(session.login(&store, "test", "test").await.unwrap());
    assert_eq!(session.id(), Some(user_id));
    assert_eq!(session.roles().len(), 1);
    assert_eq!(session.roles()[0].name(), "admin");
    assert!(session.base().created_at().is_some());

    let mut wrong = RoleBasedUser::new();
    assert!(!wrong.login(&store, "test", "nope").await.unwrap());

    session.destroy(&store).await.unwrap();
    let relations = store
        .fetch(rbac::RELATIONS_TABLE, &["usr_id"], &[("usr_id", json!(user_id))])
        .await
        .unwrap();
    assert!(relations.is_empty());
}
