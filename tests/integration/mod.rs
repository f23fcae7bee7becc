//! Integration tests for db-chat.

pub mod config_test;
pub mod pipeline_test;
pub mod sqlite_test;

use db_chat::db::SqliteClient;
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;

/// Rows seeded into the `usuarios` table.
pub const SEED: &str = "
    CREATE TABLE usuarios (
        id INTEGER PRIMARY KEY,
        nombre TEXT NOT NULL,
        email TEXT NOT NULL,
        edad INTEGER
    );
    INSERT INTO usuarios (nombre, email, edad) VALUES
        ('Ana', 'ana@example.com', 34),
        ('Luis', 'luis@example.com', 27),
        ('Marta', 'marta@example.com', NULL);
";

/// Creates a fresh in-memory database holding the seed data.
pub async fn seeded_client() -> SqliteClient {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory SQLite should open");

    sqlx::raw_sql(SEED)
        .execute(&pool)
        .await
        .expect("seed should apply");

    SqliteClient::from_pool(pool, Duration::from_secs(5))
}
