//! LLM integration for db-chat.
//!
//! Provides the completion trait, its provider implementations, prompt
//! rendering and SQL extraction from raw completions.

pub mod factory;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod parser;
pub mod prompt;

pub use factory::create_client;
pub use mock::{FailingLlmClient, MockLlmClient};
pub use ollama::{OllamaClient, OllamaConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::{create_extractor, ExtractedSql, RegexExtractor, SqlExtractor, StrictExtractor};
pub use prompt::{render, PromptTemplates};

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Result;

/// Trait for services that turn a prompt into text.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends the rendered prompt as a single user message and returns the
    /// raw completion text.
    ///
    /// Makes exactly one outbound request; failures are never retried.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt).await
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI chat completions
    #[default]
    OpenAi,
    /// Local Ollama instance
    Ollama,
    /// Mock client for testing (no API key required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
