//! Error types for ferment-relay
//!
//! Extraction failures are local to one message: they are logged and
//! reported to the caller, never retried and never fatal to the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure of one extraction-and-persist operation
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Completion service credential absent at invocation time
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Completion text was not the expected JSON object
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Transport failure or error status from the completion service
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Row could not be appended to the reading log
    #[error("Storage error: {0}")]
    Storage(#[from] ferment_common::Error),
}

/// Failure delivering a message to a running relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Request could not be sent or its reply could not be read
    #[error("Error sending message to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Relay answered with a non-success status
    #[error("relay returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Extraction failed (500)
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Plain-text body, the relay caller only logs it
        (status, format!("Error processing message: {}", self)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
