//! ferment-relay library interface
//!
//! Receives group chat messages over a local HTTP endpoint, extracts
//! fermentation readings and appends them to the reading log.

pub mod api;
pub mod error;
pub mod extract;
pub mod recorder;
pub mod relay_client;

pub use crate::error::{ApiError, ApiResult, ExtractionError, RelayError};
pub use crate::recorder::{InboundMessage, ProcessOutcome, Recorder};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Extraction pipeline bound to the reading log
    pub recorder: Arc<Recorder>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last failed message, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder: Arc::new(recorder),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::parse_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
