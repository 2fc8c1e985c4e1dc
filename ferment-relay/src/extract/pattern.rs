//! Pattern-based extraction
//!
//! Matches loosely spelled labels ("spgr", "tamp", ...) followed by an
//! optional `.`, `:` or `=` and a decimal number. Matching runs on the
//! lowercased message, so it is case-insensitive. Gravity and temperature are
//! matched independently; either, both or neither may be present.

use super::Extractor;
use crate::error::ExtractionError;
use ferment_common::config::{is_valid_key, PatternConfig};
use ferment_common::{Error, LogSchema, Reading};
use regex::Regex;
use tracing::debug;

/// Regex extractor for specific gravity and temperature
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    gravity: Regex,
    temperature: Regex,
}

impl PatternExtractor {
    /// Build from spelling variant lists
    ///
    /// Variants are lowercased and escaped, so they match literally. Order
    /// matters: earlier variants win when several could match at one spot.
    /// Only ASCII digits count as a value.
    pub fn new<S: AsRef<str>>(
        gravity_variants: &[S],
        temperature_variants: &[S],
    ) -> ferment_common::Result<Self> {
        let gravity = format!(
            r"(?:{})\.?\s*[:=]?\s*([0-9]+\.[0-9]+)",
            alternation(gravity_variants)?
        );
        let temperature = format!(
            r"(?:{})\.?\s*[:=]?\s*(-)?\s*([0-9]+(?:\.[0-9]+)?)",
            alternation(temperature_variants)?
        );

        Ok(Self {
            gravity: Regex::new(&gravity)
                .map_err(|e| Error::Config(format!("Invalid gravity pattern: {}", e)))?,
            temperature: Regex::new(&temperature)
                .map_err(|e| Error::Config(format!("Invalid temperature pattern: {}", e)))?,
        })
    }

    pub fn from_config(config: &PatternConfig) -> ferment_common::Result<Self> {
        Self::new(
            config.gravity_variants.as_slice(),
            config.temperature_variants.as_slice(),
        )
    }

    /// Synchronous extraction; never fails
    pub fn extract_reading(&self, body: &str, timestamp: i64) -> Reading {
        let text = body.to_lowercase();
        let mut reading = Reading::new(timestamp);

        if let Some(caps) = self.gravity.captures(&text) {
            // Capture group is ASCII digits.digits, always parseable
            reading.specific_gravity = caps[1].parse::<f64>().ok();
            debug!("Extracted specific gravity: {:?}", reading.specific_gravity);
        }

        if let Some(caps) = self.temperature.captures(&text) {
            let magnitude = caps[2].parse::<f64>().ok();
            let negative = caps.get(1).is_some();
            reading.temperature = magnitude.map(|t| if negative { -t } else { t });
            debug!("Extracted temperature: {:?}", reading.temperature);
        }

        reading
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        // Built-in variants are plain words and always compile
        Self::from_config(&PatternConfig::default()).expect("default patterns are valid")
    }
}

#[async_trait::async_trait]
impl Extractor for PatternExtractor {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn schema(&self) -> LogSchema {
        LogSchema::Pattern
    }

    async fn extract(&self, body: &str, timestamp: i64) -> Result<Reading, ExtractionError> {
        Ok(self.extract_reading(body, timestamp))
    }
}

fn alternation<S: AsRef<str>>(variants: &[S]) -> ferment_common::Result<String> {
    let escaped: Vec<String> = variants
        .iter()
        .map(|v| v.as_ref())
        .filter(|v| is_valid_key(v))
        .map(|v| regex::escape(&v.trim().to_lowercase()))
        .collect();

    if escaped.is_empty() {
        return Err(Error::Config(
            "At least one spelling variant is required".to_string(),
        ));
    }
    Ok(escaped.join("|"))
}
