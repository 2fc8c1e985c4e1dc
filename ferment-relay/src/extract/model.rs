//! Model-assisted extraction
//!
//! Sends the message body to a completion service with a fixed instruction
//! and decodes the reply strictly as a JSON object with four optional
//! numeric fields. Anything else fails the whole message.

use super::{CompletionClient, Extractor};
use crate::error::ExtractionError;
use ferment_common::{LogSchema, Reading};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

const INSTRUCTION: &str = "You extract fermentation readings from plant operator chat messages. \
Read the message below and reply with a minified JSON object with exactly these keys: \
\"fermenterNumber\" (integer), \"specificGravity\" (number), \"temperature\" (number, negative if below zero), \"ph\" (number). \
Use null for every value the message does not state. \
Return only the JSON object, with no other text, explanation or code fences.";

/// Build the completion prompt for one message body
pub fn build_prompt(body: &str) -> String {
    format!("{}\n\nMessage:\n{}", INSTRUCTION, body)
}

/// Expected completion payload
#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ModelReading {
    fermenter_number: Option<i64>,
    specific_gravity: Option<f64>,
    temperature: Option<f64>,
    ph: Option<f64>,
}

/// Decode completion text into a reading for `timestamp`
///
/// Only surrounding whitespace is tolerated. Prose, code fences, extra keys
/// or non-numeric values are all `MalformedResponse`.
pub fn parse_completion(text: &str, timestamp: i64) -> Result<Reading, ExtractionError> {
    let decoded: ModelReading = serde_json::from_str(text.trim())
        .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

    Ok(Reading {
        timestamp,
        fermenter_number: decoded.fermenter_number,
        specific_gravity: decoded.specific_gravity,
        temperature: decoded.temperature,
        ph: decoded.ph,
    })
}

/// Extractor backed by a [`CompletionClient`]
pub struct ModelExtractor {
    client: Arc<dyn CompletionClient>,
}

impl ModelExtractor {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Extractor for ModelExtractor {
    fn name(&self) -> &'static str {
        "model"
    }

    fn schema(&self) -> LogSchema {
        LogSchema::Model
    }

    async fn extract(&self, body: &str, timestamp: i64) -> Result<Reading, ExtractionError> {
        let completion = self.client.complete(&build_prompt(body)).await?;
        debug!("Completion text: {}", completion);

        parse_completion(&completion, timestamp).map_err(|e| {
            warn!("Unparseable completion {:?}: {}", completion, e);
            e
        })
    }
}
