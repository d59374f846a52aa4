//! Pipeline module
//!
//! The route → handler → summarize orchestrator and the types and
//! collaborator traits it is built from. Nothing in here performs I/O
//! directly; concrete collaborators live in `llm` and `handlers`.

pub mod collaborators;
pub mod constants;
pub mod error;
pub mod orchestrator;
pub mod routing;
pub mod types;
pub mod utils;

pub use collaborators::{Classifier, Handler, LanguageModel, Summarizer};
pub use error::{CollaboratorError, PipelineError};
pub use orchestrator::{PipelineOrchestrator, PipelineOrchestratorBuilder};
pub use routing::resolve_route;
pub use types::{
    ContextHandle, PipelineEvent, PipelinePhase, PipelineRequest, PipelineResult, Route,
    StageResult, StageStatus,
};
