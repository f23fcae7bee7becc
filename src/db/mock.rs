//! Mock database clients for testing.
//!
//! `MockDatabaseClient` hands back a canned result and records every SQL
//! string it receives; `FailingDatabaseClient` rejects every query.

use super::{ColumnInfo, DatabaseClient, QueryResult, Value};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns a predefined result.
pub struct MockDatabaseClient {
    response: std::result::Result<QueryResult, String>,
    executed: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockDatabaseClient {
    /// Creates a mock that answers every query with one `result` row.
    pub fn new() -> Self {
        let columns = vec![ColumnInfo::new("result", "TEXT")];
        let rows = vec![vec![Value::from("mock")]];
        let result = QueryResult {
            columns,
            rows,
            execution_time: Duration::from_millis(1),
        };
        Self::with_result(result)
    }

    /// Creates a mock that answers every query with `result`.
    pub fn with_result(result: QueryResult) -> Self {
        Self {
            response: Ok(result),
            executed: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a mock whose queries fail with the given database message.
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            executed: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `execute_query` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// SQL strings received, oldest first.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|sqls| sqls.clone())
            .unwrap_or_default()
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sqls) = self.executed.lock() {
            sqls.push(sql.to_string());
        }

        match &self.response {
            Ok(result) => Ok(result.clone()),
            Err(message) => Err(ChatError::query(message.clone())),
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose every query fails.
#[derive(Debug, Default)]
pub struct FailingDatabaseClient;

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(ChatError::query("database unavailable"))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
