//! Streaming utilities for Server-Sent Events (SSE)
//!
//! Contains utilities for turning a stream of text events into an SSE
//! HTTP response.

use crate::error::AppError;
use anyhow::anyhow;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{stream::Stream, StreamExt};

/// SSE stream termination signal
pub const SSE_DONE_SIGNAL: &str = "[DONE]";

/// SSE error prefix
pub const SSE_ERROR_PREFIX: &str = "[ERROR]";

/// Format a stream into SSE (Server-Sent Events) format
///
/// Each item becomes `data: <content>\n\n`; errors are reported inline with
/// the `[ERROR]` prefix instead of terminating the stream.
pub fn format_sse_stream(
    stream: impl Stream<Item = Result<String, axum::Error>> + Send + 'static,
) -> impl Stream<Item = Result<String, std::io::Error>> {
    stream.map(|event_result| {
        let sse_text = match event_result {
            Ok(data) => format!("data: {}\n\n", data),
            Err(e) => format!("data: {} {}\n\n", SSE_ERROR_PREFIX, e),
        };
        Ok::<_, std::io::Error>(sse_text)
    })
}

/// Build an SSE HTTP response from a stream of events
///
/// # Returns
/// * `Result<Response, AppError>` - SSE HTTP response or error
pub fn sse_response(
    stream: impl Stream<Item = Result<String, axum::Error>> + Send + 'static,
) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(format_sse_stream(stream)))
        .map_err(|e| AppError::Internal(anyhow!("Failed to build SSE response: {}", e)))
}
