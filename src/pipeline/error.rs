//! Pipeline error types
//!
//! Two layers of failure exist in the pipeline:
//! - `PipelineError`: the only errors that can leave the orchestrator
//!   (blank input at `run`, wiring defects at construction).
//! - `CollaboratorError`: failures of external collaborators (model calls,
//!   search calls, retrieval). These never leave `run`; they are folded into
//!   the stage result or trigger a fallback.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the orchestrator itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Request text was empty or whitespace only
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Route/handler wiring is inconsistent (detected at construction)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors reported by external collaborators (classifier, handlers, summarizer)
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// No API key was configured for a hosted model
    #[error("API key is empty")]
    MissingApiKey,

    /// The HTTP request could not be sent or its body could not be read
    #[error("Request failed: {0}")]
    Request(String),

    /// The upstream service answered with a non-success status
    #[error("Upstream returned error status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (for diagnostics)
        body: String,
    },

    /// The upstream service rejected the call because of quota limits
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The hosted model refused to answer the prompt
    #[error("Prompt was blocked: {0}")]
    Blocked(String),

    /// The response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The collaborator answered, but with nothing usable
    #[error("Empty response: {0}")]
    Empty(String),

    /// The call exceeded the per-stage time budget
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The collaborator panicked while producing its answer
    #[error("Collaborator panicked: {0}")]
    Panicked(String),

    /// Any other failure
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        CollaboratorError::Request(e.to_string())
    }
}
