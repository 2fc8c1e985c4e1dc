//! Shared helpers for ferment-relay integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use ferment_common::MemoryLog;
use ferment_relay::extract::{CompletionClient, Extractor, ModelExtractor, PatternExtractor};
use ferment_relay::{AppState, ExtractionError, Recorder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Completion client that replays a canned answer and records prompts
pub struct ScriptedCompletion {
    reply: Result<String, fn() -> ExtractionError>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: fn() -> ExtractionError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}

/// App state using the pattern strategy and an in-memory log
pub fn pattern_state() -> (AppState, Arc<MemoryLog>) {
    state_for(Arc::new(PatternExtractor::default()))
}

/// App state using the model strategy over `client`
pub fn model_state(client: Arc<ScriptedCompletion>) -> (AppState, Arc<MemoryLog>) {
    state_for(Arc::new(ModelExtractor::new(client)))
}

fn state_for(extractor: Arc<dyn Extractor>) -> (AppState, Arc<MemoryLog>) {
    let log = Arc::new(MemoryLog::new(extractor.schema()));
    let recorder = Recorder::new(extractor, log.clone());
    (AppState::new(recorder), log)
}

/// Build a `POST /parse` request for a message
pub fn parse_request(body: &str, timestamp: i64) -> Request<Body> {
    let payload = serde_json::json!({
        "message": { "body": body, "timestamp": timestamp }
    });
    Request::builder()
        .method("POST")
        .uri("/parse")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

/// Read a response body as UTF-8 text
pub async fn body_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
}
