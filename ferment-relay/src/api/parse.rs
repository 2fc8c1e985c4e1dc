//! Message intake endpoint
//!
//! `POST /parse` with `{ "message": { "body": ..., "timestamp": ... } }`.
//! Responds once processing finishes: 200 whether or not a row was written,
//! 500 with a plain-text description if extraction failed.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::ApiResult;
use crate::recorder::{InboundMessage, ProcessOutcome};
use crate::AppState;

/// Confirmation body for a processed message
pub const PROCESSED: &str = "Message processed";

/// Relay request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRequest {
    pub message: InboundMessage,
}

/// POST /parse
pub async fn parse_message(
    State(state): State<AppState>,
    Json(request): Json<ParseRequest>,
) -> ApiResult<&'static str> {
    match state.recorder.process(&request.message).await {
        Ok(ProcessOutcome::Recorded(_)) | Ok(ProcessOutcome::NoReadings) => Ok(PROCESSED),
        Err(e) => {
            error!(
                "Failed to process message at {}: {}",
                request.message.timestamp, e
            );
            *state.last_error.write().await = Some(e.to_string());
            Err(e.into())
        }
    }
}

/// Build message intake routes
pub fn parse_routes() -> Router<AppState> {
    Router::new().route("/parse", post(parse_message))
}
