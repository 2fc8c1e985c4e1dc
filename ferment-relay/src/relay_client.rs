//! Client side of the loopback hop
//!
//! Delivers a message to a running relay the same way the messaging bridge
//! does: one `POST /parse` per message, fire and report.

use crate::api::parse::ParseRequest;
use crate::error::RelayError;
use crate::recorder::InboundMessage;
use tracing::debug;

/// Posts messages to a relay's `/parse` endpoint
pub struct RelayClient {
    http_client: reqwest::Client,
    parse_url: String,
}

impl RelayClient {
    /// `base_url` is the relay root, e.g. `http://127.0.0.1:3000`
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            parse_url: format!("{}/parse", base_url.trim_end_matches('/')),
        }
    }

    pub fn parse_url(&self) -> &str {
        &self.parse_url
    }

    /// Send one message; returns the relay's confirmation text
    pub async fn post_message(&self, message: &InboundMessage) -> Result<String, RelayError> {
        debug!("Posting message to {}", self.parse_url);

        let response = self
            .http_client
            .post(&self.parse_url)
            .json(&ParseRequest {
                message: message.clone(),
            })
            .send()
            .await
            .map_err(|source| self.transport(source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| self.transport(source))?;
        if !status.is_success() {
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn transport(&self, source: reqwest::Error) -> RelayError {
        RelayError::Transport {
            url: self.parse_url.clone(),
            source,
        }
    }
}
