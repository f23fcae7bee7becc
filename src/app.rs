//! Core orchestrator for db-chat.
//!
//! Sequences prompt rendering, completion, SQL extraction, execution and
//! formatting, and turns every failure along the way into an answer the
//! front end can display.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ConnectionConfig, PipelineMode};
use crate::db::{self, DatabaseClient, QueryResult};
use crate::error::{ChatError, Result};
use crate::llm::{self, CompletionClient, ExtractedSql, PromptTemplates, SqlExtractor};
use crate::query::{format_simple, format_table, QueryExecutor};

/// Answer when the completion contains no usable SQL.
pub const EXTRACTION_FAILED_ANSWER: &str = "Error: No se pudo generar una consulta SQL válida.";

/// Answer when the completion service could not be reached.
pub const COMPLETION_FAILED_ANSWER: &str =
    "Error procesando la pregunta: no se obtuvo respuesta del modelo de lenguaje.";

/// Answer for a blank question.
pub const EMPTY_QUESTION_ANSWER: &str = "Error: La pregunta está vacía.";

/// A point the pipeline reached while answering a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The question was accepted.
    Start,
    /// The SQL completion came back.
    SqlGenerated,
    /// A statement was found in the completion.
    SqlExtracted,
    /// No statement could be found.
    ExtractionFailed,
    /// The statement ran and returned a result set.
    DataFetched,
    /// The database rejected or could not run the statement.
    ExecutionFailed,
    /// The summary completion came back.
    SummaryGenerated,
    /// The summary could not be produced.
    SummaryFailed,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    /// Text shown to the user. Never empty.
    pub answer: String,
    /// Stages reached, in order.
    pub stages: Vec<Stage>,
    /// The statement that was executed, if extraction succeeded.
    pub sql: Option<ExtractedSql>,
    /// The query result, if execution succeeded.
    pub result: Option<QueryResult>,
    /// The rendered summary prompt (elaborated mode only).
    pub summary_prompt: Option<String>,
}

impl PipelineOutcome {
    /// Returns the last stage reached.
    pub fn last_stage(&self) -> Option<Stage> {
        self.stages.last().copied()
    }

    /// Returns true when the answer reports a failure.
    pub fn is_error(&self) -> bool {
        self.answer.starts_with("Error")
    }
}

/// The main orchestrator that coordinates all components.
pub struct Orchestrator {
    /// Completion service for both the SQL and summary stages.
    llm: Box<dyn CompletionClient>,
    /// Database client for executing queries.
    db: Box<dyn DatabaseClient>,
    /// Finds the statement inside a raw completion.
    extractor: Box<dyn SqlExtractor>,
    /// SQL and summary prompt templates.
    templates: PromptTemplates,
    /// Pipeline variant.
    mode: PipelineMode,
}

impl Orchestrator {
    /// Creates an orchestrator in simple mode with the built-in templates.
    pub fn new(
        llm: Box<dyn CompletionClient>,
        db: Box<dyn DatabaseClient>,
        extractor: Box<dyn SqlExtractor>,
    ) -> Self {
        Self {
            llm,
            db,
            extractor,
            templates: PromptTemplates::default(),
            mode: PipelineMode::default(),
        }
    }

    /// Sets the pipeline mode.
    pub fn with_mode(mut self, mode: PipelineMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replaces the prompt templates.
    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Builds every collaborator from configuration and connects to the database.
    ///
    /// Templates and the completion client are validated before the database
    /// connection is opened.
    pub async fn from_config(config: &Config, connection: &ConnectionConfig) -> Result<Self> {
        let templates = PromptTemplates::from_config(&config.pipeline)?;
        let extractor = llm::create_extractor(&config.pipeline, connection.backend)?;
        let llm = llm::create_client(&config.llm)?;

        let query_timeout = std::time::Duration::from_secs(config.pipeline.query_timeout_secs);
        let db = db::connect(connection, query_timeout).await?;

        info!(
            "Pipeline ready: mode={}, provider={}, model={}, database={}",
            config.pipeline.mode.as_str(),
            config.llm.provider,
            config.llm.model,
            connection.display_string()
        );

        Ok(Self::new(llm, db, extractor)
            .with_templates(templates)
            .with_mode(config.pipeline.mode))
    }

    /// Returns the active pipeline mode.
    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    /// Answers a question. Always returns a non-empty string.
    pub async fn process(&self, question: &str) -> String {
        self.run(question).await.answer
    }

    /// Answers a question, keeping the trace and intermediate values.
    ///
    /// A blank question is answered without calling any collaborator and
    /// leaves the trace empty.
    pub async fn run(&self, question: &str) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::default();

        if question.trim().is_empty() {
            outcome.answer = EMPTY_QUESTION_ANSWER.to_string();
            return outcome;
        }

        outcome.stages.push(Stage::Start);
        info!(mode = self.mode.as_str(), "Processing question: {}", question);

        let result = AssertUnwindSafe(self.pipeline(question, &mut outcome))
            .catch_unwind()
            .await;

        outcome.answer = match result {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => answer_for_error(&e),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Pipeline panicked: {}", message);
                format!("Error procesando la pregunta: {}", message)
            }
        };

        debug!(stages = ?outcome.stages, "Pipeline finished");
        outcome
    }

    async fn pipeline(&self, question: &str, outcome: &mut PipelineOutcome) -> Result<String> {
        let prompt = self.templates.render_sql(question)?;
        debug!("SQL prompt:\n{}", prompt);

        let raw = self.llm.complete(&prompt).await?;
        outcome.stages.push(Stage::SqlGenerated);
        debug!("Raw completion:\n{}", raw);

        let sql = match self.extractor.extract(&raw) {
            Ok(sql) => sql,
            Err(e) => {
                outcome.stages.push(Stage::ExtractionFailed);
                warn!("No SQL statement in completion: {:?}", raw);
                return Err(e);
            }
        };
        outcome.stages.push(Stage::SqlExtracted);
        info!("Extracted SQL: {}", sql);
        outcome.sql = Some(sql.clone());

        let result = match QueryExecutor::new(self.db.as_ref()).execute(&sql).await {
            Ok(result) => result,
            Err(e) => {
                outcome.stages.push(Stage::ExecutionFailed);
                return Err(e);
            }
        };
        outcome.stages.push(Stage::DataFetched);

        let answer = match self.mode {
            PipelineMode::Simple => format_simple(&result),
            PipelineMode::Elaborated => match self.summarize(question, &result, outcome).await {
                Ok(summary) => {
                    outcome.stages.push(Stage::SummaryGenerated);
                    summary
                }
                Err(e) => {
                    outcome.stages.push(Stage::SummaryFailed);
                    outcome.result = Some(result);
                    return Err(e);
                }
            },
        };

        outcome.result = Some(result);
        Ok(answer)
    }

    async fn summarize(
        &self,
        question: &str,
        result: &QueryResult,
        outcome: &mut PipelineOutcome,
    ) -> Result<String> {
        let data = format_table(result);
        let prompt = self.templates.render_summary(question, &data)?;
        debug!("Summary prompt:\n{}", prompt);
        outcome.summary_prompt = Some(prompt.clone());

        let summary = self.llm.complete(&prompt).await?;
        if summary.trim().is_empty() {
            return Err(ChatError::llm("Empty summary completion"));
        }
        Ok(summary)
    }

    /// Closes the database connection pool.
    pub async fn close(&self) -> Result<()> {
        self.db.close().await
    }
}

/// Maps a pipeline failure to the answer shown to the user.
pub fn answer_for_error(error: &ChatError) -> String {
    match error {
        ChatError::Extraction => EXTRACTION_FAILED_ANSWER.to_string(),
        ChatError::Query(message) => format!("Error al ejecutar la consulta: {}", message),
        ChatError::Llm(message) => {
            error!("Completion service failed: {}", message);
            COMPLETION_FAILED_ANSWER.to_string()
        }
        other => {
            error!("{}: {}", other.category(), other);
            format!("Error procesando la pregunta: {}", other.message())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "error interno inesperado".to_string()
    }
}
