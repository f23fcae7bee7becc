//! MySQL database client implementation.
//!
//! Provides the `MySqlClient` struct that implements the `DatabaseClient` trait
//! for MySQL and MariaDB servers using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{
    column_infos, database_message, map_connection_error, timeout_message, DatabaseClient,
    QueryResult, Row, Value, ACQUIRE_TIMEOUT_SECS, MAX_CONNECTIONS,
};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::types::JsonValue;
use sqlx::{Column as SqlxColumn, Executor, MySql, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::time::{Duration, Instant};
use tracing::debug;

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
    query_timeout: Duration,
}

impl MySqlClient {
    /// Creates a new MySqlClient from an existing connection pool.
    pub fn from_pool(pool: MySqlPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Opens a connection pool for the given configuration.
    pub async fn connect(config: &ConnectionConfig, query_timeout: Duration) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to MySQL at {}", config.display_string());
        Ok(Self::from_pool(pool, query_timeout))
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
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

        let rows = rows.iter().map(convert_row).collect::<Result<Vec<Row>>>()?;

        Ok(QueryResult::with_data(columns, rows)?.with_execution_time(execution_time))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn get<'r, T>(row: &'r MySqlRow, index: usize) -> Result<Option<T>>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get::<Option<T>, _>(index)
        .map_err(|e| ChatError::query(format!("Cannot decode column {}: {}", index + 1, e)))
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value> {
    let type_name = type_name.to_uppercase();

    if type_name.ends_with(" UNSIGNED") {
        return Ok(get::<u64>(row, index)?.map(Value::from).unwrap_or_default());
    }

    let value = match type_name.as_str() {
        "BOOLEAN" => get::<bool>(row, index)?.map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            get::<i64>(row, index)?.map(Value::Int)
        }
        "FLOAT" => get::<f32>(row, index)?.map(|v| Value::Float(v as f64)),
        "DOUBLE" => get::<f64>(row, index)?.map(Value::Float),
        "DECIMAL" => get::<BigDecimal>(row, index)?.map(|v| Value::String(v.to_string())),
        "DATE" => get::<NaiveDate>(row, index)?.map(|v| Value::String(v.to_string())),
        "TIME" => get::<NaiveTime>(row, index)?.map(|v| Value::String(v.to_string())),
        "DATETIME" => get::<NaiveDateTime>(row, index)?.map(|v| Value::String(v.to_string())),
        "TIMESTAMP" => get::<DateTime<Utc>>(row, index)?.map(|v| Value::String(v.to_string())),
        "JSON" => get::<JsonValue>(row, index)?.map(|v| Value::String(v.to_string())),
        "BIT" => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)
            .map_err(|e| ChatError::query(format!("Cannot decode column {}: {}", index + 1, e)))?
            .map(|bits| Value::from(bits_to_u64(&bits))),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
            get::<Vec<u8>>(row, index)?.map(Value::Bytes)
        }
        _ => return convert_other(row, index, &type_name),
    };

    Ok(value.unwrap_or_default())
}

/// BIT(n) arrives as big-endian bytes.
fn bits_to_u64(bits: &[u8]) -> u64 {
    bits.iter().fold(0, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Text-like types decode as strings. Anything else is reported, never
/// shown as NULL.
fn convert_other(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value> {
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
