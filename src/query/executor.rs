//! Query execution with error containment.
//!
//! Provides isolated query execution that can be tested independently
//! of the full orchestrator.

use std::time::Instant;

use tracing::{info, warn};

use crate::db::{DatabaseClient, QueryResult};
use crate::error::{ChatError, Result};
use crate::llm::ExtractedSql;

/// Runs extracted SQL against the database.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self { db }
    }

    /// Executes the statement verbatim and returns the full result set.
    ///
    /// Every failure comes back as `ChatError::Query` with the database's
    /// message; an empty result set is a success.
    pub async fn execute(&self, sql: &ExtractedSql) -> Result<QueryResult> {
        let start = Instant::now();
        let result = self.db.execute_query(sql.as_str()).await;
        let elapsed = start.elapsed();

        match result {
            Ok(query_result) => {
                info!(
                    rows = query_result.row_count(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Query executed"
                );
                Ok(query_result)
            }
            Err(e) => {
                warn!("Query failed after {:?}: {}", elapsed, e);
                Err(match e {
                    ChatError::Query(message) => ChatError::Query(message),
                    other => ChatError::query(other.message()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnInfo, FailingDatabaseClient, MockDatabaseClient, Value};
    use crate::llm::{RegexExtractor, SqlExtractor};
    use async_trait::async_trait;

    fn sql(text: &str) -> ExtractedSql {
        RegexExtractor::new(false).unwrap().extract(text).unwrap()
    }

    struct UnreachableDatabase;

    #[async_trait]
    impl DatabaseClient for UnreachableDatabase {
        async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
            Err(ChatError::connection("Cannot connect to localhost:3306."))
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_execute_passes_sql_verbatim() {
        let mock_db = MockDatabaseClient::new();
        let executor = QueryExecutor::new(&mock_db);

        let result = executor
            .execute(&sql("SELECT nombre FROM usuarios WHERE id = 'x';"))
            .await
            .unwrap();

        assert_eq!(result.row_count(), 1);
        assert_eq!(
            mock_db.executed(),
            vec!["SELECT nombre FROM usuarios WHERE id = 'x';"]
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_success() {
        let empty = QueryResult::with_data(vec![ColumnInfo::new("nombre", "TEXT")], vec![]).unwrap();
        let mock_db = MockDatabaseClient::with_result(empty);

        let result = QueryExecutor::new(&mock_db)
            .execute(&sql("SELECT nombre FROM usuarios;"))
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_database_message_is_kept() {
        let mock_db = MockDatabaseClient::with_error("Unknown column 'emal' in 'field list'");

        let err = QueryExecutor::new(&mock_db)
            .execute(&sql("SELECT emal FROM usuarios;"))
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Query(_)));
        assert_eq!(err.message(), "Unknown column 'emal' in 'field list'");
    }

    #[tokio::test]
    async fn test_other_failures_become_query_errors() {
        let err = QueryExecutor::new(&UnreachableDatabase)
            .execute(&sql("SELECT 1 FROM dual;"))
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Query(_)));
        assert_eq!(err.message(), "Cannot connect to localhost:3306.");

        let err = QueryExecutor::new(&FailingDatabaseClient)
            .execute(&sql("SELECT 1 FROM dual;"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "database unavailable");
    }

    #[tokio::test]
    async fn test_values_are_preserved() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("edad", "INT")],
            vec![vec![Value::Int(30)], vec![Value::Null]],
        )
        .unwrap();
        let mock_db = MockDatabaseClient::with_result(result.clone());

        let fetched = QueryExecutor::new(&mock_db)
            .execute(&sql("SELECT edad FROM usuarios;"))
            .await
            .unwrap();

        assert_eq!(fetched.rows, result.rows);
    }
}
