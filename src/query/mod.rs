//! Query execution and result formatting for db-chat.
//!
//! This module isolates SQL execution and the textual rendering of results
//! from the pipeline orchestrator.

pub mod executor;
pub mod format;

pub use executor::QueryExecutor;
pub use format::{format_simple, format_table, NO_RESULTS};
