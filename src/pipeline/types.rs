//! Pipeline data model
//!
//! Value types flowing through a single pipeline run. Everything here is
//! created per request and dropped once the run completes.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Opaque reference to request context (the name of a document index)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContextHandle(String);

impl ContextHandle {
    /// Create a new context handle
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The referenced context name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A user request entering the pipeline
///
/// Immutable once built. Blank queries are accepted here and rejected by
/// the orchestrator, so that the rejection happens at the `run` boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRequest {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<ContextHandle>,
}

impl PipelineRequest {
    /// Create a request without context
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: None,
        }
    }

    /// Attach a context handle
    pub fn with_context(mut self, context: ContextHandle) -> Self {
        self.context = Some(context);
        self
    }

    /// The free-text query
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The optional context handle
    pub fn context(&self) -> Option<&ContextHandle> {
        self.context.as_ref()
    }

    /// True if the query is empty after trimming
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// A branch of the pipeline, drawn from the routes declared at construction
///
/// Routes are only produced by the orchestrator that declared them, so a
/// `Route` in hand always has a registered handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    name: String,
    keyword: String,
}

impl Route {
    pub(crate) fn new(name: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyword: keyword.into().to_lowercase(),
        }
    }

    /// Route name (the label offered to the classifier)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercase keyword searched for in the classifier's reply
    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// Outcome of the dispatch stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    /// The handler produced an answer
    Success,
    /// The handler failed; the payload describes the failure
    HandlerError,
}

/// Output of exactly one handler invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    /// Whether the handler succeeded
    pub status: StageStatus,
    /// Handler answer, or a human-readable failure description
    pub payload: String,
}

impl StageResult {
    /// Successful stage with the handler's answer
    pub fn success(payload: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Success,
            payload: payload.into(),
        }
    }

    /// Failed stage with a description of what went wrong
    pub fn handler_error(description: impl Into<String>) -> Self {
        Self {
            status: StageStatus::HandlerError,
            payload: description.into(),
        }
    }

    /// True if the handler succeeded
    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Success
    }
}

/// Final output of a pipeline run
///
/// `summary` is never empty, even when the dispatch stage failed.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Unique id of this run (also used in tracing spans)
    pub run_id: Uuid,
    /// The request as received
    pub request: PipelineRequest,
    /// Route selected by classification
    pub route: Route,
    /// Dispatch stage outcome
    pub stage: StageResult,
    /// User-facing summary text
    pub summary: String,
    /// Wall-clock time spent in the run
    pub elapsed_ms: u64,
    /// When the run reached `Done`
    pub completed_at: DateTime<Utc>,
}

impl PipelineResult {
    /// Status of the dispatch stage
    pub fn stage_status(&self) -> StageStatus {
        self.stage.status
    }
}

/// Phases of a run, in the only order they may occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    /// Request accepted, nothing started
    Idle,
    /// Waiting for the classifier
    Classifying,
    /// Waiting for the route handler
    Dispatching,
    /// Waiting for the summarizer
    Summarizing,
    /// Result assembled
    Done,
}

/// Progress notification emitted on every phase transition
#[derive(Debug, Clone, Serialize)]
pub struct PipelineEvent {
    /// Phase just entered
    pub phase: PipelinePhase,
    /// Human-readable progress message
    pub message: String,
    /// Selected route, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}
