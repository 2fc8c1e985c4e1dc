//! Extraction strategies
//!
//! Two interchangeable ways of turning a message body into a [`Reading`]:
//! - [`PatternExtractor`]: regex heuristics, no external dependency
//! - [`ModelExtractor`]: one call to an external text-completion service
//!
//! A relay process runs exactly one of them, chosen at startup. They are
//! never chained; a model failure does not fall back to patterns.

pub mod completion;
pub mod model;
pub mod pattern;

pub use completion::{ChatCompletionClient, CompletionClient};
pub use model::ModelExtractor;
pub use pattern::PatternExtractor;

use crate::error::ExtractionError;
use ferment_common::config::{ApiKeySource, ServiceConfig, Strategy};
use ferment_common::{LogSchema, Reading};
use std::sync::Arc;

/// A strategy that derives a reading from raw message text
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    /// Strategy name for logs and health output
    fn name(&self) -> &'static str;

    /// Column layout of the rows this strategy produces
    fn schema(&self) -> LogSchema;

    /// Extract whatever fields the text carries
    ///
    /// An empty reading is a normal result, not an error.
    async fn extract(&self, body: &str, timestamp: i64) -> Result<Reading, ExtractionError>;
}

/// Build the extractor selected by `config.strategy`
pub fn build_extractor(config: &ServiceConfig) -> ferment_common::Result<Arc<dyn Extractor>> {
    match config.strategy {
        Strategy::Pattern => Ok(Arc::new(PatternExtractor::from_config(&config.pattern)?)),
        Strategy::Model => {
            let client = ChatCompletionClient::new(
                &config.completion,
                ApiKeySource::for_completion(&config.completion),
            )?;
            Ok(Arc::new(ModelExtractor::new(Arc::new(client))))
        }
    }
}
