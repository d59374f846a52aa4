//! Pipeline orchestrator
//!
//! Runs every request through the same fixed sequence:
//!
//! ```text
//! Idle -> Classifying -> Dispatching -> Summarizing -> Done
//! ```
//!
//! Each stage executes exactly once, with no retries. Dispatch and summarize
//! run even when an earlier stage failed, so a run always ends with text the
//! user can read. The only hard failure is a blank request, which is rejected
//! before any collaborator is called.

use crate::pipeline::collaborators::{Classifier, Handler, Summarizer};
use crate::pipeline::constants::{DEFAULT_STAGE_TIMEOUT_SECS, EMPTY_OUTPUT_SUMMARY};
use crate::pipeline::error::{CollaboratorError, PipelineError};
use crate::pipeline::routing::resolve_route;
use crate::pipeline::types::{
    PipelineEvent, PipelinePhase, PipelineRequest, PipelineResult, Route, StageResult,
};
use crate::pipeline::utils::{hash_query, panic_message};
use futures_util::FutureExt;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tracing::Instrument;
use uuid::Uuid;

/// Classify → dispatch → summarize pipeline
///
/// Construct with [`PipelineOrchestrator::builder`]. The route registry is
/// validated once in [`PipelineOrchestratorBuilder::build`] and never
/// mutated afterwards, so one instance can serve concurrent runs behind an
/// `Arc`.
pub struct PipelineOrchestrator {
    routes: Vec<Route>,
    default_route: Route,
    handlers: HashMap<String, Arc<dyn Handler>>,
    classifier: Arc<dyn Classifier>,
    summarizer: Arc<dyn Summarizer>,
    stage_timeout: Duration,
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("routes", &self.routes)
            .field("default_route", &self.default_route)
            .field("stage_timeout", &self.stage_timeout)
            .finish_non_exhaustive()
    }
}

impl PipelineOrchestrator {
    /// Start configuring an orchestrator
    pub fn builder() -> PipelineOrchestratorBuilder {
        PipelineOrchestratorBuilder::default()
    }

    /// Declared routes, in declaration order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Route used when classification is inconclusive
    pub fn default_route(&self) -> &Route {
        &self.default_route
    }

    /// Time budget for each external call
    pub fn stage_timeout(&self) -> Duration {
        self.stage_timeout
    }

    /// Classify a request into exactly one declared route
    ///
    /// # Returns
    /// * `Ok(Route)` - The matched route, or the default route when the
    ///   classifier reply mentions no route keyword or the classifier
    ///   fails, times out or panics
    /// * `Err(PipelineError::InvalidInput)` - Blank query (no external call made)
    pub async fn classify(&self, request: &PipelineRequest) -> Result<Route, PipelineError> {
        ensure_not_blank(request)?;

        let labels: Vec<&str> = self.routes.iter().map(Route::name).collect();
        let reply = self
            .bounded(self.classifier.classify_text(request.query(), &labels))
            .await;

        let route = match reply {
            Ok(reply) => {
                let route = resolve_route(&reply, &self.routes, &self.default_route);
                tracing::debug!(
                    reply_len = reply.len(),
                    route = %route,
                    "Classifier reply resolved"
                );
                route.clone()
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    default_route = %self.default_route,
                    "Classifier failed, falling back to default route"
                );
                self.default_route.clone()
            }
        };

        Ok(route)
    }

    /// Run the handler registered for `route`
    ///
    /// Never fails: handler errors, timeouts, panics and empty answers are
    /// all captured as a `handler-error` stage result whose payload
    /// describes the failure.
    pub async fn dispatch(&self, route: &Route, request: &PipelineRequest) -> StageResult {
        let Some(handler) = self.handlers.get(route.name()) else {
            // Routes are only minted by this orchestrator; a miss means the
            // route came from a differently configured instance.
            tracing::error!(route = %route, "No handler registered for route");
            return StageResult::handler_error(format!(
                "No handler is registered for route '{}'",
                route
            ));
        };

        match self.bounded(handler.handle(request)).await {
            Ok(answer) if answer.trim().is_empty() => {
                tracing::warn!(route = %route, "Handler returned an empty answer");
                StageResult::handler_error(format!(
                    "Handler for route '{}' returned an empty answer",
                    route
                ))
            }
            Ok(answer) => {
                tracing::debug!(route = %route, answer_len = answer.len(), "Handler succeeded");
                StageResult::success(answer)
            }
            Err(e) => {
                tracing::warn!(route = %route, error = %e, "Handler failed");
                StageResult::handler_error(format!("Handler for route '{}' failed: {}", route, e))
            }
        }
    }

    /// Produce the user-facing summary for a stage result
    ///
    /// Runs for failed stages too. If the summarizer fails, panics or
    /// replies with nothing, the stage payload is returned verbatim.
    pub async fn summarize(&self, stage: &StageResult) -> String {
        let fallback = || {
            if stage.payload.trim().is_empty() {
                EMPTY_OUTPUT_SUMMARY.to_string()
            } else {
                stage.payload.clone()
            }
        };

        match self
            .bounded(self.summarizer.summarize_text(&stage.payload))
            .await
        {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => {
                tracing::warn!("Summarizer returned empty text, using stage payload");
                fallback()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Summarizer failed, using stage payload");
                fallback()
            }
        }
    }

    /// Run the full pipeline for one request
    ///
    /// # Returns
    /// * `Ok(PipelineResult)` - For every non-blank request, whatever the
    ///   collaborators did
    /// * `Err(PipelineError::InvalidInput)` - Blank query, reported before
    ///   any external call
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineResult, PipelineError> {
        self.run_with_events(request, None).await
    }

    /// Run the pipeline, reporting each phase transition on `events`
    ///
    /// Event delivery is best effort: a dropped receiver does not affect
    /// the run.
    pub async fn run_with_events(
        &self,
        request: PipelineRequest,
        events: Option<UnboundedSender<PipelineEvent>>,
    ) -> Result<PipelineResult, PipelineError> {
        ensure_not_blank(&request)?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "pipeline_run",
            run_id = %run_id,
            query_hash = %hash_query(request.query()),
        );

        self.run_inner(run_id, request, events.as_ref())
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        request: PipelineRequest,
        events: Option<&UnboundedSender<PipelineEvent>>,
    ) -> Result<PipelineResult, PipelineError> {
        let start = Instant::now();
        emit(events, PipelinePhase::Idle, "Request accepted", None);

        emit(events, PipelinePhase::Classifying, "Classifying request...", None);
        let route = self.classify(&request).await?;

        emit(
            events,
            PipelinePhase::Dispatching,
            format!("Dispatching to '{}' handler...", route),
            Some(&route),
        );
        let stage = self.dispatch(&route, &request).await;

        emit(
            events,
            PipelinePhase::Summarizing,
            if stage.is_success() {
                "Summarizing answer...".to_string()
            } else {
                "Handler failed, summarizing error...".to_string()
            },
            Some(&route),
        );
        let summary = self.summarize(&stage).await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            route = %route,
            stage_status = ?stage.status,
            summary_len = summary.len(),
            elapsed_ms = elapsed_ms,
            "Pipeline run completed"
        );
        emit(events, PipelinePhase::Done, "Done", Some(&route));

        Ok(PipelineResult {
            run_id,
            request,
            route,
            stage,
            summary,
            elapsed_ms,
            completed_at: chrono::Utc::now(),
        })
    }

    /// Await one collaborator call under the stage timeout, turning a
    /// timeout or a panic into a `CollaboratorError`
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, CollaboratorError>>,
    ) -> Result<T, CollaboratorError> {
        match timeout(self.stage_timeout, AssertUnwindSafe(call).catch_unwind()).await {
            Err(_) => Err(CollaboratorError::Timeout(self.stage_timeout)),
            Ok(Err(panic)) => Err(CollaboratorError::Panicked(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result,
        }
    }
}

fn ensure_not_blank(request: &PipelineRequest) -> Result<(), PipelineError> {
    if request.is_blank() {
        return Err(PipelineError::InvalidInput(
            "Query cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn emit(
    events: Option<&UnboundedSender<PipelineEvent>>,
    phase: PipelinePhase,
    message: impl Into<String>,
    route: Option<&Route>,
) {
    if let Some(tx) = events {
        let _ = tx.send(PipelineEvent {
            phase,
            message: message.into(),
            route: route.map(|r| r.name().to_string()),
        });
    }
}

/// Builder that validates route wiring before an orchestrator exists
///
/// Every declared route must have exactly one handler, every handler must
/// belong to a declared route, and the default route must be declared.
pub struct PipelineOrchestratorBuilder {
    routes: Vec<(String, String)>,
    handlers: Vec<(String, Arc<dyn Handler>)>,
    default_route: Option<String>,
    classifier: Option<Arc<dyn Classifier>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    stage_timeout: Duration,
}

impl Default for PipelineOrchestratorBuilder {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            handlers: Vec::new(),
            default_route: None,
            classifier: None,
            summarizer: None,
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
        }
    }
}

impl PipelineOrchestratorBuilder {
    /// Declare a route whose keyword is its own name
    pub fn route(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let keyword = name.clone();
        self.route_with_keyword(name, keyword)
    }

    /// Declare a route matched by a keyword other than its name
    pub fn route_with_keyword(mut self, name: impl Into<String>, keyword: impl Into<String>) -> Self {
        self.routes.push((name.into(), keyword.into()));
        self
    }

    /// Register the handler for a declared route
    pub fn handler(mut self, route: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push((route.into(), handler));
        self
    }

    /// Route used when classification is inconclusive
    pub fn default_route(mut self, name: impl Into<String>) -> Self {
        self.default_route = Some(name.into());
        self
    }

    /// Classification collaborator
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Summarization collaborator
    pub fn summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Time budget for each external call
    pub fn stage_timeout(mut self, stage_timeout: Duration) -> Self {
        self.stage_timeout = stage_timeout;
        self
    }

    /// Validate the wiring and build the orchestrator
    ///
    /// # Errors
    /// * `PipelineError::Configuration` - On any wiring defect
    pub fn build(self) -> Result<PipelineOrchestrator, PipelineError> {
        let config_error = |msg: String| Err(PipelineError::Configuration(msg));

        if self.routes.is_empty() {
            return config_error("at least one route must be declared".to_string());
        }

        let mut routes = Vec::with_capacity(self.routes.len());
        let mut declared = HashSet::new();
        for (name, keyword) in self.routes {
            if name.trim().is_empty() {
                return config_error("route names cannot be empty".to_string());
            }
            if keyword.trim().is_empty() {
                return config_error(format!("route '{}' has an empty keyword", name));
            }
            if !declared.insert(name.clone()) {
                return config_error(format!("route '{}' is declared more than once", name));
            }
            routes.push(Route::new(name, keyword));
        }

        let mut handlers = HashMap::with_capacity(self.handlers.len());
        for (route, handler) in self.handlers {
            if !declared.contains(&route) {
                return config_error(format!(
                    "handler registered for undeclared route '{}'",
                    route
                ));
            }
            if handlers.insert(route.clone(), handler).is_some() {
                return config_error(format!(
                    "more than one handler registered for route '{}'",
                    route
                ));
            }
        }

        if let Some(missing) = routes.iter().find(|r| !handlers.contains_key(r.name())) {
            return config_error(format!("route '{}' has no registered handler", missing));
        }

        let Some(default_name) = self.default_route else {
            return config_error("no default route configured".to_string());
        };
        let Some(default_route) = routes.iter().find(|r| r.name() == default_name).cloned()
        else {
            return config_error(format!(
                "default route '{}' is not a declared route",
                default_name
            ));
        };

        let Some(classifier) = self.classifier else {
            return config_error("no classifier configured".to_string());
        };
        let Some(summarizer) = self.summarizer else {
            return config_error("no summarizer configured".to_string());
        };

        if self.stage_timeout.is_zero() {
            return config_error("stage timeout must be > 0".to_string());
        }

        tracing::debug!(
            routes = ?routes.iter().map(Route::name).collect::<Vec<_>>(),
            default_route = %default_route,
            stage_timeout_ms = self.stage_timeout.as_millis() as u64,
            "Pipeline orchestrator configured"
        );

        Ok(PipelineOrchestrator {
            routes,
            default_route,
            handlers,
            classifier,
            summarizer,
            stage_timeout: self.stage_timeout,
        })
    }
}
