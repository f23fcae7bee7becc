//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating completion clients.

use crate::config::LlmConfig;
use crate::error::{ChatError, Result};
use crate::llm::{
    CompletionClient, LlmProvider, MockLlmClient, OllamaClient, OllamaConfig, OpenAiClient,
    OpenAiConfig,
};

/// Creates a completion client from the `[llm]` configuration section.
///
/// For OpenAI the API key is resolved in order:
/// 1. `api_key` in the configuration
/// 2. The `OPENAI_API_KEY` environment variable
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn CompletionClient>> {
    let provider: LlmProvider = config.provider.parse().map_err(ChatError::config)?;

    match provider {
        LlmProvider::OpenAi => {
            let key = resolve_api_key(config, |name| std::env::var(name).ok())?;
            let mut openai = OpenAiConfig::new(key, &config.model)
                .with_temperature(config.temperature)
                .with_timeout(config.timeout_secs);
            if let Some(base_url) = &config.base_url {
                openai = openai.with_base_url(base_url);
            }
            Ok(Box::new(OpenAiClient::new(openai)?))
        }
        LlmProvider::Ollama => {
            let mut ollama = OllamaConfig::new(&config.model)
                .with_temperature(config.temperature)
                .with_timeout(config.timeout_secs);
            if let Some(base_url) = &config.base_url {
                ollama = ollama.with_url(base_url);
            }
            Ok(Box::new(OllamaClient::new(ollama)?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

fn resolve_api_key(config: &LlmConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.is_empty())
        .or_else(|| lookup("OPENAI_API_KEY").filter(|key| !key.is_empty()))
        .ok_or_else(|| {
            ChatError::config("No API key configured. Set OPENAI_API_KEY or llm.api_key.")
        })
}
