//! Extraction-and-persist pipeline
//!
//! One call per inbound message: extract a reading with the configured
//! strategy, then append one row to the reading log if any field was found.
//! Calls share nothing but the log.

use crate::error::ExtractionError;
use crate::extract::Extractor;
use ferment_common::{LogSchema, ReadingLog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Message payload delivered by the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub body: String,
    /// Origination time from the messaging network, stored verbatim
    pub timestamp: i64,
}

/// What `process` did with a message
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// A row was appended
    Recorded(String),
    /// Nothing extractable; no row written
    NoReadings,
}

/// Runs one extraction strategy against one reading log
pub struct Recorder {
    extractor: Arc<dyn Extractor>,
    log: Arc<dyn ReadingLog>,
}

impl Recorder {
    /// Pair an extractor with a log
    ///
    /// The log should be initialized with `extractor.schema()`; rows are
    /// always formatted with the extractor's schema.
    pub fn new(extractor: Arc<dyn Extractor>, log: Arc<dyn ReadingLog>) -> Self {
        if extractor.schema() != log.schema() {
            warn!(
                "Extractor '{}' writes {} rows into a log initialized as {}",
                extractor.name(),
                extractor.schema(),
                log.schema()
            );
        }
        Self { extractor, log }
    }

    pub fn strategy(&self) -> &'static str {
        self.extractor.name()
    }

    pub fn schema(&self) -> LogSchema {
        self.extractor.schema()
    }

    /// Extract and persist one message
    ///
    /// Absence of data is success. Any error leaves the log untouched.
    pub async fn process(&self, message: &InboundMessage) -> Result<ProcessOutcome, ExtractionError> {
        info!("Received message to parse: {}", message.body);

        let reading = self
            .extractor
            .extract(&message.body, message.timestamp)
            .await?;

        if !reading.has_values() {
            debug!("No readings in message at {}", message.timestamp);
            return Ok(ProcessOutcome::NoReadings);
        }

        let row = reading.to_row(self.extractor.schema());
        self.log.append(&row)?;
        info!("Saved reading: {}", row);

        Ok(ProcessOutcome::Recorded(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PatternExtractor;
    use ferment_common::MemoryLog;

    fn message(body: &str) -> InboundMessage {
        InboundMessage {
            body: body.to_string(),
            timestamp: 1700000000,
        }
    }

    #[tokio::test]
    async fn test_records_pattern_reading() {
        let log = Arc::new(MemoryLog::new(LogSchema::Pattern));
        let recorder = Recorder::new(Arc::new(PatternExtractor::default()), log.clone());

        let outcome = recorder
            .process(&message("Spgr = 1.048 temp 30.5"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProcessOutcome::Recorded("1700000000,1.048,30.5".to_string())
        );
        assert_eq!(log.rows(), vec!["1700000000,1.048,30.5"]);
    }

    #[tokio::test]
    async fn test_no_readings_writes_nothing() {
        let log = Arc::new(MemoryLog::new(LogSchema::Pattern));
        let recorder = Recorder::new(Arc::new(PatternExtractor::default()), log.clone());

        let outcome = recorder.process(&message("lunch at noon")).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::NoReadings);
        assert!(log.rows().is_empty());
    }

    #[tokio::test]
    async fn test_reports_strategy() {
        let log = Arc::new(MemoryLog::new(LogSchema::Pattern));
        let recorder = Recorder::new(Arc::new(PatternExtractor::default()), log);
        assert_eq!(recorder.strategy(), "pattern");
        assert_eq!(recorder.schema(), LogSchema::Pattern);
    }
}
