//! Pipeline API handlers
//!
//! HTTP wrappers around `PipelineOrchestrator::run`. Blank or oversized
//! queries are rejected with 400 before the pipeline starts; every other
//! request gets a result, even when a stage failed.

use crate::api::streaming::{sse_response, SSE_DONE_SIGNAL, SSE_ERROR_PREFIX};
use crate::api::utils::validate_query;
use crate::error::AppError;
use crate::pipeline::{ContextHandle, PipelineRequest, PipelineResult};
use crate::state::AppState;
use axum::{
    extract::State,
    response::{Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pipeline run request
#[derive(Deserialize, Debug)]
pub struct RunPipelineRequest {
    /// The user's question
    pub query: String,
    /// Optional document index name for the lookup route
    #[serde(default)]
    pub context: Option<String>,
}

impl RunPipelineRequest {
    fn into_pipeline_request(self) -> PipelineRequest {
        let request = PipelineRequest::new(self.query);
        match self.context.filter(|c| !c.trim().is_empty()) {
            Some(context) => request.with_context(ContextHandle::new(context)),
            None => request,
        }
    }
}

/// A declared route
#[derive(Debug, Serialize)]
pub struct RouteInfo {
    /// Route name
    pub name: String,
    /// Keyword matched in classifier replies
    pub keyword: String,
}

/// Pipeline wiring overview
#[derive(Debug, Serialize)]
pub struct RoutesResponse {
    /// Declared routes, in match order
    pub routes: Vec<RouteInfo>,
    /// Route used when classification is inconclusive
    pub default_route: String,
    /// Per-stage timeout in seconds
    pub stage_timeout_secs: u64,
    /// Document indexes addressable through `context`
    pub document_indexes: Vec<String>,
}

/// GET /api/routes - Describe the configured routes
pub async fn list_routes(State(state): State<Arc<AppState>>) -> Json<RoutesResponse> {
    let orchestrator = &state.orchestrator;
    Json(RoutesResponse {
        routes: orchestrator
            .routes()
            .iter()
            .map(|r| RouteInfo {
                name: r.name().to_string(),
                keyword: r.keyword().to_string(),
            })
            .collect(),
        default_route: orchestrator.default_route().name().to_string(),
        stage_timeout_secs: orchestrator.stage_timeout().as_secs(),
        document_indexes: state
            .documents
            .index_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// POST /api/pipeline/run - Run the pipeline and return the result
///
/// # Returns
/// * `Ok(Json<PipelineResult>)` - For every accepted query
/// * `Err(AppError)` - Blank or oversized query (400)
pub async fn run_pipeline(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunPipelineRequest>,
) -> Result<Json<PipelineResult>, AppError> {
    validate_query(&request.query, state.max_query_length)?;

    let result = state
        .orchestrator
        .run(request.into_pipeline_request())
        .await?;

    Ok(Json(result))
}

/// POST /api/pipeline/stream - Run the pipeline, streaming progress via SSE
///
/// Emits one JSON `PipelineEvent` per phase, then `{"result": ...}`, then
/// `[DONE]`.
pub async fn stream_pipeline(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunPipelineRequest>,
) -> Result<Response, AppError> {
    use async_stream::stream;

    validate_query(&request.query, state.max_query_length)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let orchestrator = state.orchestrator.clone();
    let pipeline_request = request.into_pipeline_request();
    let run = tokio::spawn(async move {
        orchestrator
            .run_with_events(pipeline_request, Some(tx))
            .await
    });

    let stream = stream! {
        // Channel closes when the run finishes and drops its sender
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => yield Ok::<String, axum::Error>(json),
                Err(e) => yield Err(axum::Error::new(e)),
            }
        }

        match run.await {
            Ok(Ok(result)) => {
                match serde_json::to_string(&serde_json::json!({ "result": result })) {
                    Ok(json) => yield Ok(json),
                    Err(e) => yield Err(axum::Error::new(e)),
                }
            }
            Ok(Err(e)) => yield Ok(format!("{} {}", SSE_ERROR_PREFIX, e)),
            Err(e) => {
                tracing::error!(error = %e, "Pipeline task failed");
                yield Ok(format!("{} pipeline task failed: {}", SSE_ERROR_PREFIX, e));
            }
        }

        yield Ok(SSE_DONE_SIGNAL.to_string());
    };

    sse_response(stream)
}
