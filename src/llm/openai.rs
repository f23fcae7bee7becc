//! OpenAI LLM client implementation.
//!
//! Implements the CompletionClient trait for OpenAI's chat completions API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::llm::CompletionClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OpenAI API base URL.
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// API base URL, for OpenAI-compatible endpoints.
    pub base_url: String,
}

impl OpenAiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: OPENAI_API_BASE.to_string(),
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new OpenAI client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Returns the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Builds the request body for a single-prompt completion.
    fn build_request(&self, prompt: &str) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: self.config.temperature,
            stream: false,
        }
    }

    /// Parses an API error response.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> ChatError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ChatError::llm("Authentication failed. Check your OPENAI_API_KEY.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ChatError::llm("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            return ChatError::llm(format!(
                "OpenAI API error: {}",
                error_response.error.message
            ));
        }

        ChatError::llm(format!("OpenAI API error ({}): {}", status, body))
    }

    /// Extracts the first choice's text from a successful response body.
    fn parse_response(body: &str) -> Result<String> {
        let response: OpenAiResponse = serde_json::from_str(body)
            .map_err(|e| ChatError::llm(format!("Failed to parse response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ChatError::llm("No response from OpenAI"))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt);

        debug!("OpenAI request to model {}", self.config.model);

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::llm("Request timed out.")
                } else if e.is_connect() {
                    ChatError::llm("Failed to connect to OpenAI API. Check your network.")
                } else {
                    ChatError::llm(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        Self::parse_response(&body)
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = OpenAiConfig::new("sk-test", "gpt-4o-mini");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.base_url, OPENAI_API_BASE);
    }

    #[test]
    fn test_config_builders() {
        let config = OpenAiConfig::new("sk-test", "gpt-4o-mini")
            .with_timeout(60)
            .with_temperature(0.5)
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.temperature, 0.5);

        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(
            client.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_is_single_user_message() {
        let client = OpenAiClient::new(OpenAiConfig::new("sk-test", "gpt-4o-mini")).unwrap();
        let request = client.build_request("¿Cuántos usuarios hay?");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "¿Cuántos usuarios hay?");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"SELECT 1;"}}]}"#;
        assert_eq!(OpenAiClient::parse_response(body).unwrap(), "SELECT 1;");
    }

    #[test]
    fn test_parse_response_without_choices() {
        let err = OpenAiClient::parse_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ChatError::Llm(_)));

        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(OpenAiClient::parse_response(body).is_err());
    }

    #[test]
    fn test_parse_error_unauthorized() {
        let error = OpenAiClient::parse_error(reqwest::StatusCode::UNAUTHORIZED, "");
        assert!(error.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_parse_error_rate_limited() {
        let error = OpenAiClient::parse_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert!(error.to_string().contains("Rate limited"));
    }

    #[test]
    fn test_parse_error_with_message() {
        let body = r#"{"error":{"message":"Invalid API key"}}"#;
        let error = OpenAiClient::parse_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(error.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_llm_error() {
        let config = OpenAiConfig::new("sk-test", "gpt-4o-mini")
            .with_base_url("http://127.0.0.1:1/v1")
            .with_timeout(2);
        let client = OpenAiClient::new(config).unwrap();

        let err = client.complete("hola").await.unwrap_err();
        assert!(matches!(err, ChatError::Llm(_)));
    }
}
