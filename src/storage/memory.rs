//! In-memory data store
//!
//! Backs the table contract with plain vectors of rows behind a lock. Used
//! as the development/test backend; the per-operation counters let tests
//! assert the exact shape of multi-step cascades.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::datastore::{DataStore, Row, TableDef};
use crate::utils::error::{Result, StoreError};

/// Counters for storage operations, incremented after each successful call
#[derive(Debug, Default)]
pub struct OpCounters {
    /// Successful fetch calls
    pub fetches: AtomicU64,
    /// Successful insert calls
    pub inserts: AtomicU64,
    /// Successful update calls
    pub updates: AtomicU64,
    /// Successful delete calls
    pub deletes: AtomicU64,
}

impl OpCounters {
    /// Snapshot of (fetches, inserts, updates, deletes)
    pub fn snapshot(&self) -> (u64, u64, u64, u64) {
        (
            self.fetches.load(Ordering::SeqCst),
            self.inserts.load(Ordering::SeqCst),
            self.updates.load(Ordering::SeqCst),
            self.deletes.load(Ordering::SeqCst),
        )
    }
}

#[derive(Debug)]
struct MemTable {
    def: TableDef,
    rows: Vec<Row>,
    next_id: i64,
    last_insert_id: Option<i64>,
}

/// In-process table store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemTable>>,
    ops: OpCounters,
}

impl MemoryStore {
    /// Create an empty store with no tables declared
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation counters for this store
    pub fn ops(&self) -> &OpCounters {
        &self.ops
    }

    fn unknown_table(table: &str) -> StoreError {
        StoreError::config(format!("table `{table}` has not been declared"))
    }
}

fn check_columns(table: &str, def: &TableDef, pairs: &[(&str, Value)]) -> Result<()> {
    for (column, _) in pairs {
        if def.column(column).is_none() {
            return Err(StoreError::config(format!(
                "table `{table}` has no column `{column}`"
            )));
        }
    }
    Ok(())
}

fn matches(row: &Row, conditions: &[(&str, Value)]) -> bool {
    conditions
        .iter()
        .all(|(column, value)| row.get(*column) == Some(value))
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn fetch(
        &self,
        table: &str,
        columns: &[&str],
        conditions: &[(&str, Value)],
    ) -> Result<Vec<Row>> {
        let tables = self.tables.read();
        let mem = tables.get(table).ok_or_else(|| Self::unknown_table(table))?;

        for column in columns {
            if mem.def.column(column).is_none() {
                return Err(StoreError::config(format!(
                    "table `{table}` has no column `{column}`"
                )));
            }
        }
        check_columns(table, &mem.def, conditions)?;

        let rows = mem
            .rows
            .iter()
            .filter(|row| matches(row, conditions))
            .map(|row| {
                columns
                    .iter()
                    .map(|column| {
                        let value = row.get(*column).cloned().unwrap_or(Value::Null);
                        (column.to_string(), value)
                    })
                    .collect()
            })
            .collect();

        self.ops.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(rows)
    }

    async fn insert(&self, table: &str, values: &[(&str, Value)]) -> Result<()> {
        let mut tables = self.tables.write();
        let mem = tables
            .get_mut(table)
            .ok_or_else(|| Self::unknown_table(table))?;

        let mut row = Row::new();
        for (column, value) in values {
            if mem.def.column(column).is_none() {
                return Err(StoreError::config(format!(
                    "table `{table}` has no column `{column}`"
                )));
            }
            row.insert(column.to_string(), value.clone());
        }

        let auto_column = mem.def.auto_increment_column().map(|c| c.name.clone());
        if let Some(name) = auto_column {
            if !row.contains_key(&name) {
                let id = mem.next_id;
                mem.next_id += 1;
                row.insert(name, Value::from(id));
                mem.last_insert_id = Some(id);
            }
        }

        // Fill timestamp defaults the way the SQL backends would.
        for column in &mem.def.columns {
            if !row.contains_key(&column.name) {
                if let Some(default) = &column.default {
                    let value = if default.eq_ignore_ascii_case("CURRENT_TIMESTAMP") {
                        Value::from(
                            chrono::Utc::now()
                                .naive_utc()
                                .format("%Y-%m-%d %H:%M:%S")
                                .to_string(),
                        )
                    } else {
                        Value::from(default.clone())
                    };
                    row.insert(column.name.clone(), value);
                } else if column.not_null && !column.auto_increment {
                    return Err(StoreError::validation(format!(
                        "column `{}` of table `{table}` requires a value",
                        column.name
                    )));
                }
            }
        }

        mem.rows.push(row);
        self.ops.inserts.fetch_add(1, Ordering::SeqCst);
        debug!(table, "row inserted");
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        conditions: &[(&str, Value)],
        values: &[(&str, Value)],
    ) -> Result<u64> {
        let mut tables = self.tables.write();
        let mem = tables
            .get_mut(table)
            .ok_or_else(|| Self::unknown_table(table))?;

        check_columns(table, &mem.def, values)?;
        check_columns(table, &mem.def, conditions)?;

        let mut changed = 0;
        for row in mem.rows.iter_mut().filter(|row| matches(row, conditions)) {
            for (column, value) in values {
                row.insert(column.to_string(), value.clone());
            }
            changed += 1;
        }

        self.ops.updates.fetch_add(1, Ordering::SeqCst);
        Ok(changed)
    }

    async fn delete(&self, table: &str, conditions: &[(&str, Value)]) -> Result<u64> {
        let mut tables = self.tables.write();
        let mem = tables
            .get_mut(table)
            .ok_or_else(|| Self::unknown_table(table))?;
        check_columns(table, &mem.def, conditions)?;

        let before = mem.rows.len();
        mem.rows.retain(|row| !matches(row, conditions));
        let removed = (before - mem.rows.len()) as u64;

        self.ops.deletes.fetch_add(1, Ordering::SeqCst);
        debug!(table, removed, "rows deleted");
        Ok(removed)
    }

    async fn create_table(&self, def: &TableDef) -> Result<()> {
        let mut tables = self.tables.write();
        tables.entry(def.name.clone()).or_insert_with(|| MemTable {
            def: def.clone(),
            rows: Vec::new(),
            next_id: 1,
            last_insert_id: None,
        });
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.tables.write().remove(table);
        Ok(())
    }

    async fn last_insert_id(&self, table: &str) -> Result<i64> {
        let tables = self.tables.read();
        let mem = tables.get(table).ok_or_else(|| Self::unknown_table(table))?;
        mem.last_insert_id
            .ok_or_else(|| StoreError::not_found(format!("no insert recorded for `{table}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::datastore::{ColumnDef, ColumnType};
    use serde_json::json;

    fn things_table() -> TableDef {
        TableDef::new(
            "things",
            vec![
                ColumnDef::new("id", ColumnType::Integer)
                    .primary_key()
                    .auto_increment(),
                ColumnDef::new("name", ColumnType::VarChar(35)),
                ColumnDef::new("created", ColumnType::Timestamp).default_expr("CURRENT_TIMESTAMP"),
            ],
        )
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        store.create_table(&things_table()).await.unwrap();

        store
            .insert("things", &[("name", json!("first"))])
            .await
            .unwrap();
        assert_eq!(store.last_insert_id("things").await.unwrap(), 1);

        store
            .insert("things", &[("name", json!("second"))])
            .await
            .unwrap();
        assert_eq!(store.last_insert_id("things").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_timestamp_default_is_filled() {
        let store = MemoryStore::new();
        store.create_table(&things_table()).await.unwrap();
        store
            .insert("things", &[("name", json!("x"))])
            .await
            .unwrap();

        let rows = store
            .fetch("things", &["created"], &[])
            .await
            .unwrap();
        assert!(rows[0]["created"].is_string());
    }

    #[tokio::test]
    async fn test_fetch_filters_and_projects() {
        let store = MemoryStore::new();
        store.create_table(&things_table()).await.unwrap();
        store
            .insert("things", &[("name", json!("keep"))])
            .await
            .unwrap();
        store
            .insert("things", &[("name", json!("skip"))])
            .await
            .unwrap();

        let rows = store
            .fetch("things", &["id", "name"], &[("name", json!("keep"))])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("keep"));
        assert!(rows[0].contains_key("id"));
        assert!(!rows[0].contains_key("created"));
    }

    #[tokio::test]
    async fn test_update_and_delete_report_row_counts() {
        let store = MemoryStore::new();
        store.create_table(&things_table()).await.unwrap();
        store
            .insert("things", &[("name", json!("a"))])
            .await
            .unwrap();
        store
            .insert("things", &[("name", json!("a"))])
            .await
            .unwrap();

        let changed = store
            .update("things", &[("name", json!("a"))], &[("name", json!("b"))])
            .await
            .unwrap();
        assert_eq!(changed, 2);

        let removed = store
            .delete("things", &[("name", json!("b"))])
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let removed = store
            .delete("things", &[("name", json!("b"))])
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_unknown_condition_column_is_an_error() {
        let store = MemoryStore::new();
        store.create_table(&things_table()).await.unwrap();

        let result = store
            .fetch("things", &["id"], &[("nmae", json!("x"))])
            .await;
        assert!(matches!(result, Err(StoreError::Config(_))));

        let result = store
            .update("things", &[("nmae", json!("x"))], &[("name", json!("y"))])
            .await;
        assert!(matches!(result, Err(StoreError::Config(_))));

        let result = store.delete("things", &[("nmae", json!("x"))]).await;
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_undeclared_table_is_an_error() {
        let store = MemoryStore::new();
        let result = store.fetch("nowhere", &["id"], &[]).await;
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_required_column_is_rejected() {
        let store = MemoryStore::new();
        store.create_table(&things_table()).await.unwrap();
        let result = store.insert("things", &[]).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }
}
