//! SQLite database client implementation.
//!
//! Useful for local files and for exercising the pipeline against a real
//! engine without a server.

use crate::config::ConnectionConfig;
use crate::db::{
    column_infos, database_message, timeout_message, DatabaseClient, QueryResult, Row, Value,
    ACQUIRE_TIMEOUT_SECS, MAX_CONNECTIONS,
};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row as SqlxRow, Sqlite, Statement, ValueRef};
use std::time::{Duration, Instant};
use tracing::debug;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqliteClient {
    /// Creates a new SqliteClient from an existing connection pool.
    pub fn from_pool(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Opens the database file (or an in-memory database).
    pub async fn connect(config: &ConnectionConfig, query_timeout: Duration) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        // Every connection to `sqlite::memory:` is a separate database, so
        // in-memory pools are pinned to one connection that never expires.
        let in_memory = conn_str == "sqlite::memory:";
        let mut options = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { MAX_CONNECTIONS })
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS));
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options.connect(&conn_str).await.map_err(|e| {
            ChatError::connection(format!(
                "Cannot open SQLite database '{}': {}",
                config.database.as_deref().unwrap_or("unknown"),
                e
            ))
        })?;

        debug!("Opened SQLite database {}", config.display_string());
        Ok(Self::from_pool(pool, query_timeout))
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ChatError::query(database_message(&e)))?;

        let rows = tokio::time::timeout(self.query_timeout, sqlx::query(sql).fetch_all(&mut *conn))
            .await
            .map_err(|_| ChatError::query(timeout_message(self.query_timeout)))?
            .map_err(|e| ChatError::query(database_message(&e)))?;

        let execution_time = start.elapsed();

        let columns = match rows.first() {
            Some(first_row) => column_infos(first_row.columns()),
            None => match (&mut *conn).prepare(sql).await {
                Ok(statement) => column_infos(statement.columns()),
                Err(e) => {
                    debug!("Could not describe empty result: {}", e);
                    Vec::new()
                }
            },
        };

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows)?.with_execution_time(execution_time))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn get<'r, T>(row: &'r SqliteRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get::<T, _>(index).ok()
}

fn convert_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single value by its storage class.
///
/// SQLite is dynamically typed, so the declared column type says little
/// about what a given cell holds.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(_) => {}
        Err(_) => return Value::Null,
    }

    get::<i64>(row, index)
        .map(Value::Int)
        .or_else(|| get::<f64>(row, index).map(Value::Float))
        .or_else(|| get::<String>(row, index).map(Value::String))
        .or_else(|| get::<Vec<u8>>(row, index).map(Value::Bytes))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseBackend;

    async fn memory_client() -> SqliteClient {
        let config = ConnectionConfig {
            backend: DatabaseBackend::Sqlite,
            database: Some(":memory:".to_string()),
            ..Default::default()
        };
        SqliteClient::connect(&config, Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_select_literals() {
        let client = memory_client().await;

        let result = client
            .execute_query("SELECT 1 AS num, 'hola' AS saludo, 2.5 AS precio, NULL AS nada")
            .await
            .unwrap();

        assert_eq!(result.columns.len(), 4);
        assert_eq!(result.columns[1].name, "saludo");
        assert_eq!(
            result.rows[0],
            vec![
                Value::Int(1),
                Value::from("hola"),
                Value::Float(2.5),
                Value::Null
            ]
        );
    }

    #[tokio::test]
    async fn test_state_persists_across_queries() {
        let client = memory_client().await;

        client
            .execute_query("CREATE TABLE usuarios (id INTEGER PRIMARY KEY, nombre TEXT)")
            .await
            .unwrap();
        client
            .execute_query("INSERT INTO usuarios (nombre) VALUES ('Ana'), ('Luis')")
            .await
            .unwrap();

        let result = client
            .execute_query("SELECT nombre FROM usuarios ORDER BY id")
            .await
            .unwrap();

        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows[1][0], Value::from("Luis"));
    }

    #[tokio::test]
    async fn test_empty_result_keeps_columns() {
        let client = memory_client().await;
        client
            .execute_query("CREATE TABLE usuarios (id INTEGER, nombre TEXT)")
            .await
            .unwrap();

        let result = client
            .execute_query("SELECT id, nombre FROM usuarios")
            .await
            .unwrap();

        assert!(result.is_empty());
        let names: Vec<_> = result.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "nombre"]);
    }

    #[tokio::test]
    async fn test_error_carries_database_message() {
        let client = memory_client().await;

        let error = client
            .execute_query("SELECT * FROM tabla_inexistente")
            .await
            .unwrap_err();

        assert!(matches!(error, ChatError::Query(_)));
        assert_eq!(error.message(), "no such table: tabla_inexistente");
    }

    #[tokio::test]
    async fn test_pool_survives_failed_query() {
        let client = memory_client().await;

        assert!(client.execute_query("SELEC 1").await.is_err());
        let result = client.execute_query("SELECT 1").await.unwrap();
        assert_eq!(result.rows[0][0], Value::Int(1));
    }
}
