// Application state management
// Holds the wired pipeline shared by all request handlers

use crate::config::Config;
use crate::error::AppError;
use crate::handlers::{DocumentLookupHandler, WebSearchHandler, LLM_ROUTE, RAG_ROUTE, WEB_ROUTE};
use crate::llm::{DirectAnswerHandler, GeminiClient, LlmClassifier, LlmSummarizer};
use crate::pipeline::{LanguageModel, PipelineError, PipelineOrchestrator};
use crate::services::documents::DocumentLibrary;
use anyhow::anyhow;
use std::sync::Arc;

/// Shared application state
///
/// Everything in here is read-only after startup, so handlers share it
/// through a plain `Arc` without locking.
#[derive(Clone)]
pub struct AppState {
    /// The research pipeline
    pub orchestrator: Arc<PipelineOrchestrator>,
    /// Loaded document indexes (for the `rag` route)
    pub documents: Arc<DocumentLibrary>,
    /// Maximum accepted query length in characters
    pub max_query_length: usize,
}

impl AppState {
    /// Create state around an already built orchestrator
    pub fn new(
        orchestrator: Arc<PipelineOrchestrator>,
        documents: Arc<DocumentLibrary>,
        max_query_length: usize,
    ) -> Self {
        Self {
            orchestrator,
            documents,
            max_query_length,
        }
    }

    /// Wire the full research pipeline from configuration
    ///
    /// Loads the document folder, builds the Gemini client and registers
    /// one handler per route. Wiring defects surface here, at startup.
    ///
    /// # Errors
    /// * `AppError::Documents` - If the data folder cannot be read
    /// * `AppError::Configuration` - If the route wiring is invalid
    /// * `AppError::Internal` - If an HTTP client cannot be created
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        if config.gemini.api_key.is_none() {
            tracing::warn!(
                "GEMINI_API_KEY is not set; model-backed stages will report errors and fall back"
            );
        }

        let documents = Arc::new(DocumentLibrary::load_dir(&config.documents.data_dir).await?);

        let model: Arc<dyn LanguageModel> = Arc::new(
            GeminiClient::from_config(&config.gemini)
                .map_err(|e| AppError::Internal(anyhow!("Failed to create Gemini client: {}", e)))?,
        );

        let search_http = reqwest::Client::builder()
            .timeout(config.pipeline.stage_timeout())
            .build()
            .map_err(|e| AppError::Internal(anyhow!("Failed to create HTTP client: {}", e)))?;

        let orchestrator =
            build_research_pipeline(config, model, search_http, documents.clone())?;

        Ok(Self::new(
            Arc::new(orchestrator),
            documents,
            config.pipeline.max_query_length,
        ))
    }
}

/// Build the `web` / `rag` / `llm` research pipeline
///
/// # Errors
/// * `PipelineError::Configuration` - If the configured default route is
///   not one of the three routes
pub fn build_research_pipeline(
    config: &Config,
    model: Arc<dyn LanguageModel>,
    search_http: reqwest::Client,
    documents: Arc<DocumentLibrary>,
) -> Result<PipelineOrchestrator, PipelineError> {
    PipelineOrchestrator::builder()
        .route(WEB_ROUTE)
        .route(RAG_ROUTE)
        .route(LLM_ROUTE)
        .handler(
            WEB_ROUTE,
            Arc::new(WebSearchHandler::new(search_http, &config.search)),
        )
        .handler(
            RAG_ROUTE,
            Arc::new(DocumentLookupHandler::new(
                documents,
                model.clone(),
                config.documents.top_k,
            )),
        )
        .handler(LLM_ROUTE, Arc::new(DirectAnswerHandler::new(model.clone())))
        .default_route(config.pipeline.default_route.clone())
        .classifier(Arc::new(LlmClassifier::new(model.clone())))
        .summarizer(Arc::new(LlmSummarizer::new(model)))
        .stage_timeout(config.pipeline.stage_timeout())
        .build()
}
