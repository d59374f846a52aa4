//! Integration tests for the pipeline orchestrator
//!
//! These tests drive the orchestrator through its public API with counting
//! mock collaborators and verify:
//! 1. Blank input is rejected before any collaborator is called
//! 2. Classification falls back to the default route deterministically
//! 3. Handler failures become `handler-error` stage results
//! 4. Each run calls classify, handle and summarize exactly once

use async_trait::async_trait;
use research_pipeline::pipeline::{
    Classifier, CollaboratorError, Handler, PipelineError, PipelineOrchestrator, PipelineRequest,
    StageStatus, Summarizer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Classifier returning a fixed reply and counting calls
struct MockClassifier {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockClassifier {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify_text(
        &self,
        _text: &str,
        _candidate_labels: &[&str],
    ) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(e) => Err(CollaboratorError::Request(e.clone())),
        }
    }
}

/// Handler returning a fixed answer or a simulated network error
struct MockHandler {
    answer: Result<String, String>,
    calls: AtomicUsize,
}

impl MockHandler {
    fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(answer.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(error.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Handler for MockHandler {
    async fn handle(&self, _request: &PipelineRequest) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(answer) => Ok(answer.clone()),
            Err(e) => Err(CollaboratorError::Request(e.clone())),
        }
    }
}

/// Summarizer with a fixed reply, an echo mode, or a failure mode
#[derive(Clone)]
enum SummaryMode {
    Fixed(String),
    Echo,
    Fail,
}

struct MockSummarizer {
    mode: SummaryMode,
    calls: AtomicUsize,
}

impl MockSummarizer {
    fn new(mode: SummaryMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize_text(&self, text: &str) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            SummaryMode::Fixed(summary) => Ok(summary.clone()),
            SummaryMode::Echo => Ok(text.to_string()),
            SummaryMode::Fail => Err(CollaboratorError::Request(
                "summarizer unavailable".to_string(),
            )),
        }
    }
}

struct Fixture {
    classifier: Arc<MockClassifier>,
    search: Arc<MockHandler>,
    lookup: Arc<MockHandler>,
    direct: Arc<MockHandler>,
    summarizer: Arc<MockSummarizer>,
}

impl Fixture {
    fn new(
        classifier: Arc<MockClassifier>,
        direct: Arc<MockHandler>,
        summarizer: Arc<MockSummarizer>,
    ) -> Self {
        Self {
            classifier,
            search: MockHandler::answering("AAPL: $190"),
            lookup: MockHandler::answering("From the docs: ..."),
            direct,
            summarizer,
        }
    }

    fn orchestrator(&self) -> PipelineOrchestrator {
        PipelineOrchestrator::builder()
            .route("search")
            .route("lookup")
            .route("direct")
            .handler("search", self.search.clone())
            .handler("lookup", self.lookup.clone())
            .handler("direct", self.direct.clone())
            .default_route("direct")
            .classifier(self.classifier.clone())
            .summarizer(self.summarizer.clone())
            .build()
            .expect("valid configuration")
    }

    fn handler_calls(&self) -> usize {
        self.search.calls() + self.lookup.calls() + self.direct.calls()
    }
}

/// Scenario A: substring classification, successful handler, fixed summary
#[tokio::test]
async fn test_scenario_search_route_success() {
    let fixture = Fixture::new(
        MockClassifier::replying("I think this is a search query"),
        MockHandler::answering("direct answer"),
        MockSummarizer::new(SummaryMode::Fixed("Stock price summary".to_string())),
    );
    let orchestrator = fixture.orchestrator();

    let request = PipelineRequest::new("latest stock price of X");
    let route = orchestrator.classify(&request).await.unwrap();
    assert_eq!(route.name(), "search");

    let result = orchestrator.run(request).await.unwrap();

    assert_eq!(result.route.name(), "search");
    assert_eq!(result.stage_status(), StageStatus::Success);
    assert_eq!(result.stage.payload, "AAPL: $190");
    assert_eq!(result.summary, "Stock price summary");
    assert_eq!(result.request.query(), "latest stock price of X");
}

/// Scenario B: unknown label, default route, failing handler, echo summary
#[tokio::test]
async fn test_scenario_default_route_handler_error() {
    let fixture = Fixture::new(
        MockClassifier::replying("unknown"),
        MockHandler::failing("simulated network error"),
        MockSummarizer::new(SummaryMode::Echo),
    );
    let orchestrator = fixture.orchestrator();

    let request = PipelineRequest::new("hello");
    let route = orchestrator.classify(&request).await.unwrap();
    assert_eq!(route.name(), "direct");

    let stage = orchestrator.dispatch(&route, &request).await;
    assert_eq!(stage.status, StageStatus::HandlerError);
    assert!(stage.payload.contains("simulated network error"));

    let result = orchestrator.run(request).await.unwrap();
    assert_eq!(result.route.name(), "direct");
    assert_eq!(result.stage_status(), StageStatus::HandlerError);
    assert!(!result.summary.is_empty());
    assert_eq!(result.summary, result.stage.payload);
}

#[tokio::test]
async fn test_blank_input_makes_no_collaborator_calls() {
    let fixture = Fixture::new(
        MockClassifier::replying("search"),
        MockHandler::answering("direct answer"),
        MockSummarizer::new(SummaryMode::Echo),
    );
    let orchestrator = fixture.orchestrator();

    for query in ["", "   ", "\n\t"] {
        let result = orchestrator.run(PipelineRequest::new(query)).await;
        assert!(
            matches!(result, Err(PipelineError::InvalidInput(_))),
            "query {:?} should be rejected",
            query
        );

        let classified = orchestrator.classify(&PipelineRequest::new(query)).await;
        assert!(matches!(classified, Err(PipelineError::InvalidInput(_))));
    }

    assert_eq!(fixture.classifier.calls(), 0);
    assert_eq!(fixture.handler_calls(), 0);
    assert_eq!(fixture.summarizer.calls(), 0);
}

#[tokio::test]
async fn test_unrecognized_label_resolves_to_default_deterministically() {
    let fixture = Fixture::new(
        MockClassifier::replying("no idea, honestly"),
        MockHandler::answering("direct answer"),
        MockSummarizer::new(SummaryMode::Echo),
    );
    let orchestrator = fixture.orchestrator();
    let request = PipelineRequest::new("what should I cook tonight?");

    for _ in 0..5 {
        let route = orchestrator.classify(&request).await.unwrap();
        assert_eq!(route.name(), "direct");
    }
}

#[tokio::test]
async fn test_classifier_failure_falls_back_to_default() {
    let fixture = Fixture::new(
        MockClassifier::failing("quota exceeded"),
        MockHandler::answering("direct answer"),
        MockSummarizer::new(SummaryMode::Fixed("ok".to_string())),
    );
    let orchestrator = fixture.orchestrator();

    let result = orchestrator
        .run(PipelineRequest::new("anything"))
        .await
        .unwrap();

    assert_eq!(result.route.name(), "direct");
    assert_eq!(result.stage_status(), StageStatus::Success);
    assert_eq!(fixture.direct.calls(), 1);
}

#[tokio::test]
async fn test_summarizer_failure_returns_payload_verbatim() {
    let fixture = Fixture::new(
        MockClassifier::replying("lookup"),
        MockHandler::answering("direct answer"),
        MockSummarizer::new(SummaryMode::Fail),
    );
    let orchestrator = fixture.orchestrator();

    let result = orchestrator
        .run(PipelineRequest::new("what do the docs say?"))
        .await
        .unwrap();

    assert_eq!(result.route.name(), "lookup");
    assert_eq!(result.summary, "From the docs: ...");
}

#[tokio::test]
async fn test_each_stage_runs_exactly_once_per_run() {
    let fixture = Fixture::new(
        MockClassifier::replying("search"),
        MockHandler::failing("boom"),
        MockSummarizer::new(SummaryMode::Echo),
    );
    let orchestrator = fixture.orchestrator();

    for i in 1..=3 {
        orchestrator
            .run(PipelineRequest::new(format!("query {}", i)))
            .await
            .unwrap();

        assert_eq!(fixture.classifier.calls(), i);
        assert_eq!(fixture.handler_calls(), i);
        assert_eq!(fixture.summarizer.calls(), i);
    }
}

#[tokio::test]
async fn test_non_blank_requests_always_produce_summary() {
    let modes = [
        SummaryMode::Fixed("summary".to_string()),
        SummaryMode::Echo,
        SummaryMode::Fail,
    ];

    for mode in modes {
        for handler in [
            MockHandler::answering("answer"),
            MockHandler::failing("network down"),
        ] {
            let fixture = Fixture::new(
                MockClassifier::replying("???"),
                handler,
                MockSummarizer::new(mode.clone()),
            );
            let result = fixture
                .orchestrator()
                .run(PipelineRequest::new("x"))
                .await
                .unwrap();
            assert!(!result.summary.trim().is_empty());
        }
    }
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let fixture = Fixture::new(
        MockClassifier::replying("search"),
        MockHandler::answering("direct answer"),
        MockSummarizer::new(SummaryMode::Echo),
    );
    let orchestrator = Arc::new(fixture.orchestrator());

    let mut tasks = Vec::new();
    for i in 0..8 {
        let orchestrator = orchestrator.clone();
        tasks.push(tokio::spawn(async move {
            orchestrator
                .run(PipelineRequest::new(format!("query {}", i)))
                .await
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let result = task.await.unwrap().unwrap();
        assert_eq!(result.request.query(), format!("query {}", i));
        assert_eq!(result.summary, "AAPL: $190");
    }

    assert_eq!(fixture.classifier.calls(), 8);
    assert_eq!(fixture.search.calls(), 8);
    assert_eq!(fixture.summarizer.calls(), 8);
}

#[tokio::test]
async fn test_result_serializes_route_and_status() {
    let fixture = Fixture::new(
        MockClassifier::replying("search"),
        MockHandler::answering("direct answer"),
        MockSummarizer::new(SummaryMode::Fixed("Stock price summary".to_string())),
    );
    let result = fixture
        .orchestrator()
        .run(PipelineRequest::new("latest stock price of X"))
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["route"], "search");
    assert_eq!(json["stage"]["status"], "success");
    assert_eq!(json["summary"], "Stock price summary");
    assert_eq!(json["request"]["query"], "latest stock price of X");
    assert!(json["run_id"].is_string());
}
