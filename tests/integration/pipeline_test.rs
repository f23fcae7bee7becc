//! End-to-end pipeline tests.
//!
//! Question in, answer out, with a real SQLite database underneath.

use super::seeded_client;
use db_chat::app::{Orchestrator, Stage, COMPLETION_FAILED_ANSWER, EXTRACTION_FAILED_ANSWER};
use db_chat::config::PipelineMode;
use db_chat::db::DatabaseClient;
use db_chat::llm::{FailingLlmClient, MockLlmClient, RegexExtractor, SqlExtractor};
use db_chat::query::{format_table, QueryExecutor};
use pretty_assertions::assert_eq;
use std::sync::Arc;

async fn orchestrator(llm: Arc<MockLlmClient>, mode: PipelineMode) -> Orchestrator {
    Orchestrator::new(
        Box::new(llm),
        Box::new(seeded_client().await),
        Box::new(RegexExtractor::new(false).unwrap()),
    )
    .with_mode(mode)
}

#[tokio::test]
async fn test_simple_count() {
    let llm = Arc::new(MockLlmClient::new());
    let orchestrator = orchestrator(llm.clone(), PipelineMode::Simple).await;

    let outcome = orchestrator.run("¿Cuántos usuarios hay?").await;

    assert_eq!(outcome.answer, "Resultado: 3");
    assert_eq!(
        outcome.stages,
        vec![
            Stage::Start,
            Stage::SqlGenerated,
            Stage::SqlExtracted,
            Stage::DataFetched
        ]
    );
    assert_eq!(
        outcome.sql.as_ref().map(|s| s.as_str()),
        Some("SELECT COUNT(*) FROM usuarios;")
    );
    assert_eq!(llm.call_count(), 1);
    assert!(llm.prompts()[0].ends_with("Pregunta del usuario: ¿Cuántos usuarios hay?\n"));
}

#[tokio::test]
async fn test_simple_list_uses_first_column() {
    let llm = Arc::new(MockLlmClient::new());
    let orchestrator = orchestrator(llm, PipelineMode::Simple).await;

    let answer = orchestrator.process("Dame la lista de usuarios").await;

    assert_eq!(answer, "Resultados: Ana, Luis, Marta");
}

#[tokio::test]
async fn test_custom_completion_with_prose() {
    let llm = Arc::new(MockLlmClient::new().with_response(
        "correo de ana",
        "Aquí está:\nSELECT email, nombre FROM usuarios WHERE nombre = 'Ana';\nEspero que sirva.",
    ));
    let orchestrator = orchestrator(llm, PipelineMode::Simple).await;

    let answer = orchestrator.process("¿Cuál es el correo de Ana?").await;

    assert_eq!(answer, "Resultado: ana@example.com");
}

#[tokio::test]
async fn test_empty_result() {
    let llm = Arc::new(MockLlmClient::new().with_response(
        "mayores de 90",
        "SELECT nombre FROM usuarios WHERE edad > 90;",
    ));
    let orchestrator = orchestrator(llm, PipelineMode::Simple).await;

    let answer = orchestrator.process("Usuarios mayores de 90").await;

    assert_eq!(answer, "No se encontraron resultados para la consulta.");
}

#[tokio::test]
async fn test_null_value_in_answer() {
    let llm = Arc::new(MockLlmClient::new().with_response(
        "edad de marta",
        "SELECT edad FROM usuarios WHERE nombre = 'Marta';",
    ));
    let orchestrator = orchestrator(llm, PipelineMode::Simple).await;

    assert_eq!(
        orchestrator.process("¿Qué edad de Marta tenemos?").await,
        "Resultado: NULL"
    );
}

#[tokio::test]
async fn test_extraction_failure_never_reaches_database() {
    let llm = Arc::new(MockLlmClient::new());
    let orchestrator = orchestrator(llm.clone(), PipelineMode::Simple).await;

    let outcome = orchestrator.run("Cuéntame un chiste").await;

    assert_eq!(outcome.answer, EXTRACTION_FAILED_ANSWER);
    assert_eq!(outcome.last_stage(), Some(Stage::ExtractionFailed));
    assert!(outcome.sql.is_none());
    assert!(outcome.result.is_none());
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_database_error_is_shown_verbatim() {
    let llm = Arc::new(MockLlmClient::new().with_response(
        "pedidos",
        "SELECT total FROM pedidos;",
    ));
    let orchestrator = orchestrator(llm, PipelineMode::Simple).await;

    let outcome = orchestrator.run("¿Cuántos pedidos hay?").await;

    assert_eq!(
        outcome.answer,
        "Error al ejecutar la consulta: no such table: pedidos"
    );
    assert_eq!(outcome.last_stage(), Some(Stage::ExecutionFailed));
}

#[tokio::test]
async fn test_database_survives_failed_query() {
    let llm = Arc::new(
        MockLlmClient::new().with_response("pedidos", "SELECT total FROM pedidos;"),
    );
    let orchestrator = orchestrator(llm, PipelineMode::Simple).await;

    assert!(orchestrator.process("pedidos").await.starts_with("Error"));
    assert_eq!(
        orchestrator.process("¿Cuántos usuarios hay?").await,
        "Resultado: 3"
    );
}

#[tokio::test]
async fn test_same_question_same_answer() {
    let llm = Arc::new(MockLlmClient::new());
    let orchestrator = orchestrator(llm.clone(), PipelineMode::Simple).await;

    let first = orchestrator.process("¿Cuántos usuarios hay?").await;
    let second = orchestrator.process("¿Cuántos usuarios hay?").await;

    assert_eq!(first, second);
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_elaborated_summary_sees_table() {
    let llm = Arc::new(MockLlmClient::new());
    let orchestrator = orchestrator(llm.clone(), PipelineMode::Elaborated).await;

    let outcome = orchestrator.run("Dame la lista de usuarios").await;

    assert_eq!(
        outcome.answer,
        "Según los datos obtenidos, la consulta devolvió la información solicitada."
    );
    assert_eq!(outcome.last_stage(), Some(Stage::SummaryGenerated));
    assert_eq!(llm.call_count(), 2);

    // The summary prompt carries the exact table rendering of the result.
    let result = outcome.result.as_ref().unwrap();
    let table = format_table(result);
    assert_eq!(table, "nombre\n------\nAna\nLuis\nMarta");

    let summary_prompt = outcome.summary_prompt.as_ref().unwrap();
    assert!(summary_prompt.contains(&format!("Datos obtenidos de la base de datos:\n{table}\n")));
    assert!(summary_prompt.contains("Pregunta del usuario: Dame la lista de usuarios"));
    assert_eq!(&llm.prompts()[1], summary_prompt);
}

#[tokio::test]
async fn test_completion_failure() {
    let orchestrator = Orchestrator::new(
        Box::new(FailingLlmClient::default()),
        Box::new(seeded_client().await),
        Box::new(RegexExtractor::new(false).unwrap()),
    );

    let outcome = orchestrator.run("¿Cuántos usuarios hay?").await;

    assert_eq!(outcome.answer, COMPLETION_FAILED_ANSWER);
    assert_eq!(outcome.stages, vec![Stage::Start]);
}

#[tokio::test]
async fn test_executor_matches_pipeline_result() {
    let client = seeded_client().await;
    let sql = RegexExtractor::new(false)
        .unwrap()
        .extract("SELECT nombre, edad FROM usuarios WHERE edad IS NOT NULL;")
        .unwrap();

    let result = QueryExecutor::new(&client).execute(&sql).await.unwrap();

    assert_eq!(result.row_count(), 2);
    assert_eq!(
        format_table(&result),
        "nombre | edad\n-------+-----\nAna    |   34\nLuis   |   27"
    );
    client.close().await.unwrap();
}
