//! Database abstraction layer for db-chat.
//!
//! Provides a trait-based interface for query execution, allowing
//! different database backends to be used interchangeably.

mod mock;
mod mysql;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use sqlx::TypeInfo;
use std::sync::Arc;
use std::time::Duration;

/// Maximum number of pooled connections per client.
pub(crate) const MAX_CONNECTIONS: u32 = 5;

/// How long to wait for a free pooled connection.
pub(crate) const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    MySql,
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string or URL scheme.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the default port for this backend (0 for file databases).
    pub fn default_port(&self) -> u16 {
        match self {
            Self::MySql => 3306,
            Self::Postgres => 5432,
            Self::Sqlite => 0,
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Creates a database client for the given configuration.
///
/// The client owns a connection pool for the lifetime of the process; each
/// query borrows one connection and returns it before `execute_query` ends.
pub async fn connect(
    config: &ConnectionConfig,
    query_timeout: Duration,
) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::MySql => Ok(Box::new(MySqlClient::connect(config, query_timeout).await?)),
        DatabaseBackend::Postgres => Ok(Box::new(
            PostgresClient::connect(config, query_timeout).await?,
        )),
        DatabaseBackend::Sqlite => Ok(Box::new(SqliteClient::connect(config, query_timeout).await?)),
    }
}

/// Trait defining the interface for database clients.
///
/// Implementations map every driver failure to `ChatError::Query` carrying
/// the database's own message.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL statement verbatim and returns every row.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the connection pool.
    async fn close(&self) -> Result<()>;
}

#[async_trait]
impl<T: DatabaseClient + ?Sized> DatabaseClient for Arc<T> {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        (**self).execute_query(sql).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

/// Builds column metadata from driver columns.
pub(crate) fn column_infos<C: sqlx::Column>(columns: &[C]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Returns the database's own message for driver errors, or the driver's
/// description for everything else.
pub(crate) fn database_message(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}

/// Maps server connection errors to user-friendly messages.
pub(crate) fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ChatError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.effective_port();
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ChatError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("authentication failed") || error_str.contains("access denied")
    {
        ChatError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if (error_str.contains("does not exist") || error_str.contains("unknown database"))
        && error_str.contains("database")
    {
        ChatError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ChatError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ChatError::connection(error.to_string())
    }
}

/// Message used when a query exceeds its time budget.
pub(crate) fn timeout_message(timeout: Duration) -> String {
    format!("Query timed out after {} seconds", timeout.as_secs())
}
