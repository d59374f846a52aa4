//! Collaborator interfaces
//!
//! The orchestrator never talks to a model or a search service directly.
//! Each external dependency sits behind one of these traits so it can be
//! swapped for a mock in tests or a different provider in production.

use crate::pipeline::error::CollaboratorError;
use crate::pipeline::types::PipelineRequest;
use async_trait::async_trait;

/// Picks a route label for a piece of text
///
/// The reply is free text. It may or may not mention one of
/// `candidate_labels`; interpreting it is the orchestrator's job.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify `text` against the candidate route labels
    async fn classify_text(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<String, CollaboratorError>;
}

/// Produces the answer for one route
#[async_trait]
pub trait Handler: Send + Sync {
    /// Answer the request
    async fn handle(&self, request: &PipelineRequest) -> Result<String, CollaboratorError>;
}

/// Condenses a stage payload into user-facing text
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text`
    async fn summarize_text(&self, text: &str) -> Result<String, CollaboratorError>;
}

/// A hosted text-generation model
///
/// Shared by the model-backed classifier, summarizer and handlers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;
}
