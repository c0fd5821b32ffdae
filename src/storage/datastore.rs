//! Generic relational persistence contract
//!
//! The RBAC entities are written against this narrow table-level interface
//! rather than a concrete database. Rows travel as flat column-to-value maps
//! and conditions are column equality pairs, which is all the entity
//! lifecycle needs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::utils::error::{Result, StoreError};

/// A fetched row, mapping column name to value
pub type Row = HashMap<String, Value>;

/// Column data types understood by the stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit integer
    Integer,
    /// Unbounded text
    Text,
    /// Bounded text
    VarChar(u32),
    /// Timestamp, stored in the backend's native format
    Timestamp,
}

/// A single column definition
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Column data type
    pub ty: ColumnType,
    /// Whether this column is the primary key
    pub primary_key: bool,
    /// Whether the primary key is assigned by the database
    pub auto_increment: bool,
    /// Whether NULL values are rejected
    pub not_null: bool,
    /// Default expression applied when the column is omitted on insert
    pub default: Option<String>,
}

impl ColumnDef {
    /// Create a NOT NULL column of the given type
    pub fn new(name: &str, ty: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            primary_key: false,
            auto_increment: false,
            not_null: true,
            default: None,
        }
    }

    /// Mark the column as primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark the column as database-assigned
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Allow NULL values
    pub fn nullable(mut self) -> Self {
        self.not_null = false;
        self
    }

    /// Set a default expression, e.g. `CURRENT_TIMESTAMP`
    pub fn default_expr(mut self, expr: &str) -> Self {
        self.default = Some(expr.to_string());
        self
    }
}

/// A table shape: name plus ordered column definitions
#[derive(Debug, Clone)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Column definitions in declaration order
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Create a table definition
    pub fn new(name: &str, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.to_string(),
            columns,
        }
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The auto-increment column, if the table has one
    pub fn auto_increment_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.auto_increment)
    }
}

/// Table-level persistence operations
///
/// Implementations must register a table's [`TableDef`] in `create_table`
/// before any row operation touches it; the definition drives typed row
/// decoding and auto-increment handling.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetch rows matching all equality conditions, projected to `columns`
    async fn fetch(
        &self,
        table: &str,
        columns: &[&str],
        conditions: &[(&str, Value)],
    ) -> Result<Vec<Row>>;

    /// Insert a single row
    async fn insert(&self, table: &str, values: &[(&str, Value)]) -> Result<()>;

    /// Update matching rows, returning the number of rows changed
    async fn update(
        &self,
        table: &str,
        conditions: &[(&str, Value)],
        values: &[(&str, Value)],
    ) -> Result<u64>;

    /// Delete matching rows, returning the number of rows removed
    async fn delete(&self, table: &str, conditions: &[(&str, Value)]) -> Result<u64>;

    /// Create the table if it does not exist and register its definition
    async fn create_table(&self, def: &TableDef) -> Result<()>;

    /// Drop the table if it exists
    async fn drop_table(&self, table: &str) -> Result<()>;

    /// Identifier assigned by the most recent insert into `table`
    async fn last_insert_id(&self, table: &str) -> Result<i64>;
}

/// Extract an integer column from a fetched row
pub fn row_i64(row: &Row, column: &str) -> Result<i64> {
    row.get(column)
        .and_then(Value::as_i64)
        .ok_or_else(|| StoreError::integrity(format!("row has no integer column `{column}`")))
}

/// Extract a string column from a fetched row
pub fn row_str<'a>(row: &'a Row, column: &str) -> Result<&'a str> {
    row.get(column)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::integrity(format!("row has no text column `{column}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_builder_flags() {
        let column = ColumnDef::new("id", ColumnType::Integer)
            .primary_key()
            .auto_increment();
        assert!(column.primary_key);
        assert!(column.auto_increment);
        assert!(column.not_null);
    }

    #[test]
    fn test_table_def_lookup() {
        let def = TableDef::new(
            "things",
            vec![
                ColumnDef::new("id", ColumnType::Integer)
                    .primary_key()
                    .auto_increment(),
                ColumnDef::new("name", ColumnType::VarChar(35)),
            ],
        );
        assert!(def.column("name").is_some());
        assert!(def.column("missing").is_none());
        assert_eq!(def.auto_increment_column().unwrap().name, "id");
    }

    #[test]
    fn test_row_accessors() {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(7));
        row.insert("name".to_string(), json!("admin"));

        assert_eq!(row_i64(&row, "id").unwrap(), 7);
        assert_eq!(row_str(&row, "name").unwrap(), "admin");
        assert!(row_i64(&row, "name").is_err());
        assert!(row_str(&row, "missing").is_err());
    }
}
