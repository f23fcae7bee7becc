//! Error types for db-chat.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for db-chat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, unknown columns, permissions, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Completion service errors (timeouts, auth, transport failures, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A prompt template references a placeholder with no binding.
    #[error("Missing binding for placeholder '{{{0}}}'")]
    MissingBinding(String),

    /// The completion did not contain a recognizable SQL statement.
    #[error("No SQL statement found in the completion")]
    Extraction,

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a missing binding error for the given placeholder name.
    pub fn missing_binding(name: impl Into<String>) -> Self {
        Self::MissingBinding(name.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::MissingBinding(_) => "Template Error",
            Self::Extraction => "Extraction Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare message without the category prefix.
    ///
    /// Query errors are shown to the user verbatim, so the database's own
    /// wording must survive untouched.
    pub fn message(&self) -> String {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Llm(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::MissingBinding(_) | Self::Extraction => self.to_string(),
        }
    }
}

/// Result type alias using ChatError.
pub type Result<T> = std::result::Result<T, ChatError>;
