//! Route handlers
//!
//! One handler per declared route of the research pipeline:
//! - `web`: instant-answer web search
//! - `rag`: lookup in the local document indexes
//! - `llm`: direct model answer (see `llm::DirectAnswerHandler`)

pub mod document_lookup;
pub mod web_search;

pub use document_lookup::DocumentLookupHandler;
pub use web_search::WebSearchHandler;

/// Route name for web search
pub const WEB_ROUTE: &str = "web";

/// Route name for document lookup
pub const RAG_ROUTE: &str = "rag";

/// Route name for direct model answers
pub const LLM_ROUTE: &str = "llm";
