//! Gemini API client
//!
//! Direct HTTP client for the Gemini `generateContent` endpoint. Every
//! model-backed collaborator (classifier, summarizer, answer handlers) goes
//! through this client.

use crate::config::GeminiConfig;
use crate::llm::gemini_types::{GeminiApiRequest, GeminiApiResponse, GenerationConfig};
use crate::pipeline::collaborators::LanguageModel;
use crate::pipeline::error::CollaboratorError;
use async_trait::async_trait;
use std::time::Duration;

/// Gemini API client
///
/// Holds a shared `reqwest::Client` (connection pooling) and the model
/// settings. A missing API key is not an error at construction; calls fail
/// with `CollaboratorError::MissingApiKey` instead, which the pipeline turns
/// into a readable stage error.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: Option<f32>,
}

impl GeminiClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// * Returns `CollaboratorError::Request` if the HTTP client cannot be built
    pub fn from_config(config: &GeminiConfig) -> Result<Self, CollaboratorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: Some(config.temperature),
        })
    }

    /// Create a client around an existing HTTP client
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = GeminiConfig::default();
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: defaults.base_url,
            temperature: None,
        }
    }

    /// Override the API base URL (used by tests against a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model name used for requests
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Call `generateContent` with a single prompt
    ///
    /// # Arguments
    /// * `prompt` - The prompt to send
    /// * `force_json` - If true, request JSON response format
    ///
    /// # Returns
    /// * `Ok(String)` - Text of the first candidate's first part
    /// * `Err(CollaboratorError)` - Missing key, transport failure, non-2xx
    ///   status (429 as `RateLimited`), unparsable body, blocked prompt, or
    ///   a response without text
    pub async fn generate_content(
        &self,
        prompt: &str,
        force_json: bool,
    ) -> Result<String, CollaboratorError> {
        if self.api_key.is_empty() {
            return Err(CollaboratorError::MissingApiKey);
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let generation_config = if force_json || self.temperature.is_some() {
            Some(GenerationConfig {
                temperature: self.temperature,
                response_mime_type: force_json.then(|| "application/json".to_string()),
            })
        } else {
            None
        };
        let request_body = GeminiApiRequest::from_prompt(prompt, generation_config);

        tracing::debug!(
            model = %self.model,
            force_json = force_json,
            prompt_len = prompt.len(),
            "Calling Gemini API"
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                CollaboratorError::Request(format!(
                    "Failed to send HTTP request to Gemini API: {}",
                    e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status_code,
                error_body = %error_body,
                "Gemini API returned error status"
            );

            if status_code == 429 {
                return Err(CollaboratorError::RateLimited(format!(
                    "Gemini API (HTTP {}): {}",
                    status_code, error_body
                )));
            }

            return Err(CollaboratorError::Status {
                status: status_code,
                body: error_body,
            });
        }

        let response_body = response.text().await.map_err(|e| {
            CollaboratorError::Request(format!(
                "Failed to read response body from Gemini API: {}",
                e
            ))
        })?;

        let parsed: GeminiApiResponse = serde_json::from_str(&response_body).map_err(|e| {
            CollaboratorError::InvalidResponse(format!(
                "Failed to parse JSON response from Gemini API: {} - Response body: {}",
                e, response_body
            ))
        })?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_ref())
        {
            return Err(CollaboratorError::Blocked(reason.clone()));
        }

        let candidate = parsed.candidates.first().ok_or_else(|| {
            CollaboratorError::Empty("Gemini API response contains no candidates".to_string())
        })?;

        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(CollaboratorError::Empty(format!(
                "Gemini API response text is empty (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        tracing::debug!(
            response_len = text.len(),
            "Successfully received response from Gemini API"
        );

        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.generate_content(prompt, false).await
    }
}
