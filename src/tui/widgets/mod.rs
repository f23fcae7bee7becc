//! TUI widgets for db-chat.
//!
//! Contains reusable UI components.

pub mod chat;
pub mod header;
pub mod input;
pub mod spinner;
