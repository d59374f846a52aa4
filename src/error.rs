//! Error types and error handling for the application
//!
//! This module defines the HTTP-facing error type. All errors implement
//! `IntoResponse` to provide consistent error formatting.

use crate::pipeline::error::PipelineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Request was rejected before reaching the pipeline
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Query exceeds the configured length limit
    #[error("Query too long ({length} > {max} characters)")]
    QueryTooLong {
        /// Actual length in characters
        length: usize,
        /// Configured maximum
        max: usize,
    },

    /// Pipeline wiring is broken (startup defect)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The document folder could not be loaded
    #[error("Document error: {0}")]
    Documents(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::InvalidInput(msg) => AppError::InvalidInput(msg),
            PipelineError::Configuration(msg) => AppError::Configuration(msg),
        }
    }
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::QueryTooLong { .. } => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::Documents(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
