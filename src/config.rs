//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::pipeline::constants::DEFAULT_STAGE_TIMEOUT_SECS;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Hosted model configuration
    pub gemini: GeminiConfig,
    /// Pipeline configuration
    pub pipeline: PipelineConfig,
    /// Web search configuration
    pub search: SearchConfig,
    /// Document lookup configuration
    pub documents: DocumentsConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Gemini API configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key (`GEMINI_API_KEY`, falling back to `GOOGLE_API_KEY`)
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// API base URL
    pub base_url: String,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
}

// Keeps the key out of startup logs
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
            temperature: 0.3,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Time budget for each external call, in seconds
    pub stage_timeout_secs: u64,
    /// Maximum query length in characters
    pub max_query_length: usize,
    /// Route used when classification is inconclusive
    pub default_route: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            max_query_length: 10_000, // 10KB
            default_route: "llm".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Stage timeout as a `Duration`
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

/// Web search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Instant-answer API base URL
    pub base_url: String,
    /// Maximum number of related topics folded into an answer
    pub max_related_topics: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.duckduckgo.com".to_string(),
            max_related_topics: 5,
        }
    }
}

/// Document lookup configuration
#[derive(Debug, Clone)]
pub struct DocumentsConfig {
    /// Directory scanned for `.txt`/`.md` documents at startup
    pub data_dir: String,
    /// Number of passages handed to the model per lookup
    pub top_k: usize,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            top_k: 4,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let gemini_defaults = GeminiConfig::default();
        let pipeline_defaults = PipelineConfig::default();
        let search_defaults = SearchConfig::default();
        let documents_defaults = DocumentsConfig::default();

        Self {
            server: ServerConfig {
                port: parse_env("PORT").unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            gemini: GeminiConfig {
                api_key: non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY")),
                model: non_empty_env("GEMINI_MODEL").unwrap_or(gemini_defaults.model),
                base_url: non_empty_env("GEMINI_API_BASE_URL").unwrap_or(gemini_defaults.base_url),
                timeout_secs: parse_env("GEMINI_TIMEOUT_SECS")
                    .unwrap_or(gemini_defaults.timeout_secs),
                temperature: parse_env("GEMINI_TEMPERATURE").unwrap_or(gemini_defaults.temperature),
            },
            pipeline: PipelineConfig {
                stage_timeout_secs: parse_env("STAGE_TIMEOUT_SECS")
                    .filter(|t| *t > 0)
                    .unwrap_or(pipeline_defaults.stage_timeout_secs),
                max_query_length: parse_env("MAX_QUERY_LENGTH")
                    .filter(|l| *l > 0)
                    .unwrap_or(pipeline_defaults.max_query_length),
                default_route: non_empty_env("DEFAULT_ROUTE")
                    .unwrap_or(pipeline_defaults.default_route),
            },
            search: SearchConfig {
                base_url: non_empty_env("SEARCH_API_BASE_URL").unwrap_or(search_defaults.base_url),
                max_related_topics: parse_env("SEARCH_MAX_RELATED_TOPICS")
                    .unwrap_or(search_defaults.max_related_topics),
            },
            documents: DocumentsConfig {
                data_dir: non_empty_env("DATA_DIR").unwrap_or(documents_defaults.data_dir),
                top_k: parse_env("DOCUMENTS_TOP_K")
                    .filter(|k| *k > 0)
                    .unwrap_or(documents_defaults.top_k),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
