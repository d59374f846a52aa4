//! Research Pipeline Library
//!
//! Routes each question to one specialist handler (web search, document
//! lookup, or a direct model answer) and always finishes with a summary.
//! The server binary is in `src/main.rs`; the `ask` binary runs a single
//! query from the command line.

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod pipeline;
pub mod services;
/// Application state management
///
/// Holds the wired pipeline shared by the HTTP handlers.
pub mod state;
