//! db-chat - natural-language questions answered from a SQL database.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod query;
pub mod tui;
