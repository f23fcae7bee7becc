//! Mock LLM clients for testing.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{ChatError, Result};
use crate::llm::CompletionClient;

/// Phrase of the built-in summary template, used to tell the two stages apart.
const SUMMARY_STAGE_MARKER: &str = "datos obtenidos";

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Every prompt it receives is recorded, so tests can inspect exactly what
/// the pipeline sent.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// Prompts received, oldest first.
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the prompt contains `pattern` (case-insensitive), the mock
    /// returns `response`. Mappings are checked in insertion order.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Returns every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|prompts| prompts.len()).unwrap_or(0)
    }

    /// Generates a mock response based on the prompt.
    fn mock_response(&self, prompt: &str) -> String {
        let prompt_lower = prompt.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if prompt_lower.contains(SUMMARY_STAGE_MARKER) {
            return "Según los datos obtenidos, la consulta devolvió la información solicitada."
                .to_string();
        }

        if prompt_lower.contains("cuántos") || prompt_lower.contains("cuantos") {
            return "```sql\nSELECT COUNT(*) FROM usuarios;\n```".to_string();
        }

        if prompt_lower.contains("listado") || prompt_lower.contains("lista de usuarios") {
            return "Claro, aquí tienes la consulta:\nSELECT nombre FROM usuarios;".to_string();
        }

        "Lo siento, no entiendo la pregunta. ¿Podrías reformularla?".to_string()
    }
}

#[async_trait]
impl CompletionClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.mock_response(prompt))
    }
}

/// A completion client that always fails, as an unreachable service would.
#[derive(Debug, Clone)]
pub struct FailingLlmClient {
    message: String,
}

impl FailingLlmClient {
    /// Creates a client whose every completion fails with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingLlmClient {
    fn default() -> Self {
        Self::new("Request timed out.")
    }
}

#[async_trait]
impl CompletionClient for FailingLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(ChatError::llm(self.message.clone()))
    }
}
