//! Pipeline constants
//!
//! Centralized constants used throughout the pipeline module.

/// Summary used when neither the summarizer nor the stage produced any text
pub const EMPTY_OUTPUT_SUMMARY: &str = "The pipeline produced no output for this request.";

/// Default per-stage timeout in seconds
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 60;
