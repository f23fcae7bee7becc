//! Building the pipeline from a configuration file.

use db_chat::app::Orchestrator;
use db_chat::config::{Config, PipelineMode};
use db_chat::error::ChatError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_orchestrator_from_config_file() {
    let file = write_config(
        r#"
[llm]
provider = "mock"

[pipeline]
mode = "elaborated"

[connections.default]
backend = "sqlite"
database = ":memory:"
"#,
    );

    let config = Config::load_from_file(file.path()).unwrap();
    let connection = config.get_connection(None).cloned().unwrap();
    let orchestrator = Orchestrator::from_config(&config, &connection)
        .await
        .unwrap();

    assert_eq!(orchestrator.mode(), PipelineMode::Elaborated);

    // The in-memory database is empty, so the generated query fails.
    let answer = orchestrator.process("¿Cuántos usuarios hay?").await;
    assert_eq!(
        answer,
        "Error al ejecutar la consulta: no such table: usuarios"
    );

    orchestrator.close().await.unwrap();
}

#[tokio::test]
async fn test_custom_templates_from_config() {
    let file = write_config(
        r#"
[llm]
provider = "mock"

[pipeline]
sql_template = "Genera SQL. Pregunta: {question}"

[connections.default]
backend = "sqlite"
database = ":memory:"
"#,
    );

    let config = Config::load_from_file(file.path()).unwrap();
    let connection = config.get_connection(None).cloned().unwrap();
    let orchestrator = Orchestrator::from_config(&config, &connection)
        .await
        .unwrap();

    let outcome = orchestrator.run("¿Cuántos usuarios hay?").await;
    assert_eq!(
        outcome.sql.as_ref().map(|s| s.as_str()),
        Some("SELECT COUNT(*) FROM usuarios;")
    );
}

#[tokio::test]
async fn test_unknown_placeholder_rejected_before_connecting() {
    let file = write_config(
        r#"
[llm]
provider = "mock"

[pipeline]
sql_template = "Pregunta: {question}. Esquema: {schema}"

[connections.default]
backend = "sqlite"
database = "/ruta/que/no/existe.db"
"#,
    );

    let config = Config::load_from_file(file.path()).unwrap();
    let connection = config.get_connection(None).cloned().unwrap();
    let err = Orchestrator::from_config(&config, &connection)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, ChatError::Config(_)));
    assert!(err.to_string().contains("schema"));
}

#[tokio::test]
async fn test_unknown_provider_rejected() {
    let file = write_config(
        r#"
[llm]
provider = "anthropic"

[connections.default]
backend = "sqlite"
database = ":memory:"
"#,
    );

    let config = Config::load_from_file(file.path()).unwrap();
    let connection = config.get_connection(None).cloned().unwrap();
    let err = Orchestrator::from_config(&config, &connection)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, ChatError::Config(_)));
}
