//! Model-backed collaborators
//!
//! Thin adapters that turn any `LanguageModel` into the classifier,
//! summarizer and direct-answer handler the pipeline expects.

use crate::llm::prompts::{classification_prompt, summary_prompt};
use crate::pipeline::collaborators::{Classifier, Handler, LanguageModel, Summarizer};
use crate::pipeline::error::CollaboratorError;
use crate::pipeline::types::PipelineRequest;
use async_trait::async_trait;
use std::sync::Arc;

/// Classifier that asks the model to name a route
pub struct LlmClassifier {
    model: Arc<dyn LanguageModel>,
}

impl LlmClassifier {
    /// Create a classifier backed by `model`
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify_text(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<String, CollaboratorError> {
        let reply = self
            .model
            .generate(&classification_prompt(text, candidate_labels))
            .await?;
        Ok(reply.trim().to_string())
    }
}

/// Summarizer that asks the model for a concise summary
pub struct LlmSummarizer {
    model: Arc<dyn LanguageModel>,
}

impl LlmSummarizer {
    /// Create a summarizer backed by `model`
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize_text(&self, text: &str) -> Result<String, CollaboratorError> {
        self.model.generate(&summary_prompt(text)).await
    }
}

/// Handler for the direct-answer route: the query goes to the model as-is
pub struct DirectAnswerHandler {
    model: Arc<dyn LanguageModel>,
}

impl DirectAnswerHandler {
    /// Create a handler backed by `model`
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Handler for DirectAnswerHandler {
    async fn handle(&self, request: &PipelineRequest) -> Result<String, CollaboratorError> {
        self.model.generate(request.query()).await
    }
}
