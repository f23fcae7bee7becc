//! SQLite client tests against database files on disk.

use super::SEED;
use db_chat::config::ConnectionConfig;
use db_chat::db::{DatabaseBackend, DatabaseClient, SqliteClient, Value};
use db_chat::error::ChatError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

async fn create_database(path: &Path) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::raw_sql(SEED).execute(&pool).await.unwrap();
    pool.close().await;
}

fn file_config(path: &Path) -> ConnectionConfig {
    ConnectionConfig {
        backend: DatabaseBackend::Sqlite,
        database: Some(path.display().to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_query_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empresa.db");
    create_database(&path).await;

    let client = SqliteClient::connect(&file_config(&path), Duration::from_secs(5))
        .await
        .unwrap();

    let result = client
        .execute_query("SELECT nombre, edad FROM usuarios ORDER BY id;")
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 2);
    assert_eq!(result.columns[0].name, "nombre");
    assert_eq!(result.row_count(), 3);
    assert_eq!(result.rows[0][0], Value::String("Ana".to_string()));
    assert_eq!(result.rows[0][1], Value::Int(34));
    assert!(result.rows[2][1].is_null());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_connect_through_connection_string() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empresa.db");
    create_database(&path).await;

    let config =
        ConnectionConfig::from_connection_string(&format!("sqlite://{}", path.display())).unwrap();
    let client = db_chat::db::connect(&config, Duration::from_secs(5))
        .await
        .unwrap();

    let result = client
        .execute_query("SELECT COUNT(*) FROM usuarios;")
        .await
        .unwrap();
    assert_eq!(result.rows[0][0], Value::Int(3));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_file_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-existe.db");

    let err = SqliteClient::connect(&file_config(&path), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Connection(_)));
    assert!(err.to_string().contains("Cannot open SQLite database"));
}
