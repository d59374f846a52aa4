//! Hosted language-model integration
//!
//! The Gemini HTTP client and the collaborators built on top of any
//! `LanguageModel`.

pub mod agents;
pub mod api_client;
pub mod gemini_types;
pub mod prompts;

pub use agents::{DirectAnswerHandler, LlmClassifier, LlmSummarizer};
pub use api_client::GeminiClient;
