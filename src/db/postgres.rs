//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{
    column_infos, map_connection_error, timeout_message, DatabaseClient, QueryResult, Row, Value,
    ACQUIRE_TIMEOUT_SECS, MAX_CONNECTIONS,
};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::{JsonValue, Uuid};
use sqlx::{
    Column as SqlxColumn, Executor, Postgres, Row as SqlxRow, Statement, TypeInfo, ValueRef,
};
use std::time::{Duration, Instant};
use tracing::debug;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresClient {
    /// Creates a new PostgresClient from an existing connection pool.
    pub fn from_pool(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Opens a connection pool for the given configuration.
    pub async fn connect(config: &ConnectionConfig, query_timeout: Duration) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to PostgreSQL at {}", config.display_string());
        Ok(Self::from_pool(pool, query_timeout))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        // The connection goes back to the pool when `conn` drops, on every path.
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ChatError::query(format_query_error(&e)))?;

        let rows = tokio::time::timeout(self.query_timeout, sqlx::query(sql).fetch_all(&mut *conn))
            .await
            .map_err(|_| ChatError::query(timeout_message(self.query_timeout)))?
            .map_err(|e| ChatError::query(format_query_error(&e)))?;

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

        let rows = rows.iter().map(convert_row).collect::<Result<Vec<Row>>>()?;

        Ok(QueryResult::with_data(columns, rows)?.with_execution_time(execution_time))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Decodes a nullable column. Decode failures are query errors.
fn get<'r, T>(row: &'r PgRow, index: usize) -> Result<Option<T>>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index)
        .map_err(|e| ChatError::query(format!("Cannot decode column {}: {}", index + 1, e)))
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value> {
    let value = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => get::<bool>(row, index)?.map(Value::Bool),
        "INT2" | "SMALLINT" => get::<i16>(row, index)?.map(|v| Value::Int(v as i64)),
        "INT4" | "INT" | "INTEGER" => get::<i32>(row, index)?.map(|v| Value::Int(v as i64)),
        "INT8" | "BIGINT" => get::<i64>(row, index)?.map(Value::Int),
        "FLOAT4" | "REAL" => get::<f32>(row, index)?.map(|v| Value::Float(v as f64)),
        "FLOAT8" | "DOUBLE PRECISION" => get::<f64>(row, index)?.map(Value::Float),
        "NUMERIC" => get::<BigDecimal>(row, index)?.map(|v| Value::String(v.to_string())),
        "DATE" => get::<NaiveDate>(row, index)?.map(|v| Value::String(v.to_string())),
        "TIME" => get::<NaiveTime>(row, index)?.map(|v| Value::String(v.to_string())),
        "TIMESTAMP" => get::<NaiveDateTime>(row, index)?.map(|v| Value::String(v.to_string())),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, index)?.map(|v| Value::String(v.to_string())),
        "UUID" => get::<Uuid>(row, index)?.map(|v| Value::String(v.to_string())),
        "JSON" | "JSONB" => get::<JsonValue>(row, index)?.map(|v| Value::String(v.to_string())),
        "BYTEA" => get::<Vec<u8>>(row, index)?.map(Value::Bytes),
        _ => return convert_other(row, index, type_name),
    };

    Ok(value.unwrap_or_default())
}

/// Text-like types decode as strings. Anything else is reported, never
/// shown as NULL.
fn convert_other(row: &PgRow, index: usize, type_name: &str) -> Result<Value> {
    if let Ok(text) = row.try_get::<Option<String>, _>(index) {
        return Ok(text.map(Value::String).unwrap_or_default());
    }

    let is_null = row
        .try_get_raw(index)
        .map(|raw| raw.is_null())
        .unwrap_or(false);
    if is_null {
        return Ok(Value::Null);
    }

    Err(ChatError::query(format!(
        "Unsupported column type {} in column {}",
        type_name,
        index + 1
    )))
}

/// Formats a query error, keeping the server's message and any detail/hint.
fn format_query_error(error: &sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = db_error.message().to_string();

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}
