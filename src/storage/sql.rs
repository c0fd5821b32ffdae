//! SQL data store backed by sea-orm
//!
//! Drives the table contract with raw parameterized statements over a
//! sea-orm connection, so the same entity code runs against SQLite or
//! PostgreSQL. Table definitions registered through `create_table` supply
//! the column types used to decode query results.

use async_trait::async_trait;
use dashmap::DashMap;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::datastore::{ColumnDef, ColumnType, DataStore, Row, TableDef};
use crate::config::DatabaseConfig;
use crate::utils::error::{Result, StoreError};

/// SQL-backed table store
pub struct SqlStore {
    db: DatabaseConnection,
    schemas: DashMap<String, TableDef>,
    last_ids: DashMap<String, i64>,
}

impl SqlStore {
    /// Open a connection described by the database configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        config.validate().map_err(StoreError::config)?;

        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let db = Database::connect(options).await?;
        info!(backend = ?db.get_database_backend(), "database connection established");

        Ok(Self {
            db,
            schemas: DashMap::new(),
            last_ids: DashMap::new(),
        })
    }

    /// The underlying sea-orm connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Close the connection
    pub async fn close(self) -> Result<()> {
        self.db.close().await?;
        Ok(())
    }

    fn backend(&self) -> DatabaseBackend {
        self.db.get_database_backend()
    }

    fn schema(&self, table: &str) -> Result<TableDef> {
        self.schemas
            .get(table)
            .map(|entry| entry.clone())
            .ok_or_else(|| StoreError::config(format!("table `{table}` has not been declared")))
    }

    fn check_columns(table: &str, schema: &TableDef, pairs: &[(&str, Value)]) -> Result<()> {
        for (column, _) in pairs {
            schema.column(column).ok_or_else(|| {
                StoreError::config(format!("table `{table}` has no column `{column}`"))
            })?;
        }
        Ok(())
    }

    fn placeholder(&self, index: usize) -> String {
        match self.backend() {
            DatabaseBackend::Postgres => format!("${index}"),
            _ => "?".to_string(),
        }
    }

    fn where_clause(&self, conditions: &[(&str, Value)], first_index: usize) -> String {
        if conditions.is_empty() {
            return String::new();
        }
        let clauses: Vec<String> = conditions
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("\"{column}\" = {}", self.placeholder(first_index + i)))
            .collect();
        format!(" WHERE {}", clauses.join(" AND "))
    }

    fn column_ddl(&self, column: &ColumnDef) -> String {
        if column.primary_key && column.auto_increment {
            return match self.backend() {
                DatabaseBackend::Postgres => format!("\"{}\" BIGSERIAL PRIMARY KEY", column.name),
                _ => format!("\"{}\" INTEGER PRIMARY KEY AUTOINCREMENT", column.name),
            };
        }

        let ty = match column.ty {
            ColumnType::Integer => "BIGINT".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::VarChar(len) => format!("VARCHAR({len})"),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
        };

        let mut ddl = format!("\"{}\" {}", column.name, ty);
        if column.primary_key {
            ddl.push_str(" PRIMARY KEY");
        }
        if column.not_null {
            ddl.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            ddl.push_str(&format!(" DEFAULT {default}"));
        }
        ddl
    }

    fn decode(row: &sea_orm::QueryResult, column: &ColumnDef) -> Result<Value> {
        let value = match column.ty {
            ColumnType::Integer => row
                .try_get::<Option<i64>>("", &column.name)
                .map_err(sea_orm::DbErr::from)?
                .map(Value::from)
                .unwrap_or(Value::Null),
            ColumnType::Timestamp => row
                .try_get::<Option<chrono::NaiveDateTime>>("", &column.name)
                .map_err(sea_orm::DbErr::from)?
                .map(|ts| Value::from(ts.format("%Y-%m-%d %H:%M:%S").to_string()))
                .unwrap_or(Value::Null),
            ColumnType::Text | ColumnType::VarChar(_) => row
                .try_get::<Option<String>>("", &column.name)
                .map_err(sea_orm::DbErr::from)?
                .map(Value::from)
                .unwrap_or(Value::Null),
        };
        Ok(value)
    }
}

fn bind_value(value: &Value) -> sea_orm::Value {
    match value {
        Value::Null => sea_orm::Value::String(None),
        Value::Bool(flag) => (*flag).into(),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int.into()
            } else {
                number.as_f64().unwrap_or_default().into()
            }
        }
        Value::String(text) => text.clone().into(),
        other => other.to_string().into(),
    }
}

#[async_trait]
impl DataStore for SqlStore {
    async fn fetch(
        &self,
        table: &str,
        columns: &[&str],
        conditions: &[(&str, Value)],
    ) -> Result<Vec<Row>> {
        let schema = self.schema(table)?;
        Self::check_columns(table, &schema, conditions)?;
        let mut defs = Vec::with_capacity(columns.len());
        for column in columns {
            let def = schema.column(column).ok_or_else(|| {
                StoreError::config(format!("table `{table}` has no column `{column}`"))
            })?;
            defs.push(def.clone());
        }

        let projection: Vec<String> = columns.iter().map(|c| format!("\"{c}\"")).collect();
        let sql = format!(
            "SELECT {} FROM \"{table}\"{}",
            projection.join(", "),
            self.where_clause(conditions, 1)
        );
        let values: Vec<sea_orm::Value> =
            conditions.iter().map(|(_, v)| bind_value(v)).collect();

        let results = self
            .db
            .query_all(Statement::from_sql_and_values(self.backend(), sql, values))
            .await?;

        let mut rows = Vec::with_capacity(results.len());
        for result in &results {
            let mut row = Row::new();
            for def in &defs {
                row.insert(def.name.clone(), Self::decode(result, def)?);
            }
            rows.push(row);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, values: &[(&str, Value)]) -> Result<()> {
        let schema = self.schema(table)?;
        Self::check_columns(table, &schema, values)?;

        let columns: Vec<String> = values.iter().map(|(c, _)| format!("\"{c}\"")).collect();
        let placeholders: Vec<String> = (0..values.len())
            .map(|i| self.placeholder(i + 1))
            .collect();
        let mut sql = format!(
            "INSERT INTO \"{table}\" ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        let bound: Vec<sea_orm::Value> = values.iter().map(|(_, v)| bind_value(v)).collect();

        let auto_column = schema.auto_increment_column().map(|c| c.name.clone());
        match (self.backend(), &auto_column) {
            // RETURNING reads the id on the same connection as the
            // insert; a follow-up lastval() may land on another
            // pooled session.
            (DatabaseBackend::Postgres, Some(name)) => {
                sql.push_str(&format!(" RETURNING \"{name}\""));
                let row = self
                    .db
                    .query_one(Statement::from_sql_and_values(self.backend(), sql, bound))
                    .await?
                    .ok_or_else(|| {
                        StoreError::not_found(format!("no insert recorded for `{table}`"))
                    })?;
                let id = row.try_get::<i64>("", name).map_err(sea_orm::DbErr::from)?;
                self.last_ids.insert(table.to_string(), id);
            }
            _ => {
                let result = self
                    .db
                    .execute(Statement::from_sql_and_values(self.backend(), sql, bound))
                    .await?;
                if auto_column.is_some() {
                    self.last_ids
                        .insert(table.to_string(), result.last_insert_id() as i64);
                }
            }
        }

        debug!(table, "row inserted");
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        conditions: &[(&str, Value)],
        values: &[(&str, Value)],
    ) -> Result<u64> {
        let schema = self.schema(table)?;
        Self::check_columns(table, &schema, values)?;
        Self::check_columns(table, &schema, conditions)?;

        let assignments: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("\"{column}\" = {}", self.placeholder(i + 1)))
            .collect();
        let sql = format!(
            "UPDATE \"{table}\" SET {}{}",
            assignments.join(", "),
            self.where_clause(conditions, values.len() + 1)
        );
        let bound: Vec<sea_orm::Value> = values
            .iter()
            .chain(conditions.iter())
            .map(|(_, v)| bind_value(v))
            .collect();

        let result = self
            .db
            .execute(Statement::from_sql_and_values(self.backend(), sql, bound))
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, table: &str, conditions: &[(&str, Value)]) -> Result<u64> {
        let schema = self.schema(table)?;
        Self::check_columns(table, &schema, conditions)?;

        let sql = format!("DELETE FROM \"{table}\"{}", self.where_clause(conditions, 1));
        let bound: Vec<sea_orm::Value> = conditions.iter().map(|(_, v)| bind_value(v)).collect();

        let result = self
            .db
            .execute(Statement::from_sql_and_values(self.backend(), sql, bound))
            .await?;
        debug!(table, removed = result.rows_affected(), "rows deleted");
        Ok(result.rows_affected())
    }

    async fn create_table(&self, def: &TableDef) -> Result<()> {
        let columns: Vec<String> = def.columns.iter().map(|c| self.column_ddl(c)).collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            def.name,
            columns.join(", ")
        );

        self.db
            .execute(Statement::from_string(self.backend(), sql))
            .await?;
        self.schemas.insert(def.name.clone(), def.clone());
        debug!(table = %def.name, "table ready");
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS \"{table}\"");
        self.db
            .execute(Statement::from_string(self.backend(), sql))
            .await?;
        self.schemas.remove(table);
        self.last_ids.remove(table);
        Ok(())
    }

    async fn last_insert_id(&self, table: &str) -> Result<i64> {
        self.last_ids
            .get(table)
            .map(|entry| *entry)
            .ok_or_else(|| StoreError::not_found(format!("no insert recorded for `{table}`")))
    }
}
