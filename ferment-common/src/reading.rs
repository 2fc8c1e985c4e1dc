//! Reading model and CSV row layout
//!
//! A [`Reading`] is built for one inbound message, formatted into a single
//! log row and then dropped. The column layout depends on which extraction
//! strategy produced it, see [`LogSchema`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column layout of the reading log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSchema {
    /// `timestamp,specific_gravity,temperature`
    Pattern,
    /// `timestamp,fermenter_number,specific_gravity,temperature,ph`
    Model,
}

impl LogSchema {
    /// Column names in row order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            LogSchema::Pattern => &["timestamp", "specific_gravity", "temperature"],
            LogSchema::Model => &[
                "timestamp",
                "fermenter_number",
                "specific_gravity",
                "temperature",
                "ph",
            ],
        }
    }

    /// Header line without the line terminator
    pub fn header(&self) -> String {
        self.columns().join(",")
    }
}

impl fmt::Display for LogSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSchema::Pattern => write!(f, "pattern"),
            LogSchema::Model => write!(f, "model"),
        }
    }
}

/// One structured extraction result for a single inbound message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    /// Message-origination time, copied verbatim from the source message
    pub timestamp: i64,
    pub fermenter_number: Option<i64>,
    pub specific_gravity: Option<f64>,
    /// Sign-aware, may be negative
    pub temperature: Option<f64>,
    pub ph: Option<f64>,
}

impl Reading {
    /// Create an empty reading for the given message timestamp
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }

    /// True when at least one measured field is present
    pub fn has_values(&self) -> bool {
        self.fermenter_number.is_some()
            || self.specific_gravity.is_some()
            || self.temperature.is_some()
            || self.ph.is_some()
    }

    /// Format the reading as one comma-separated row (no line terminator)
    ///
    /// Absent fields become empty columns. Fields that the schema does not
    /// carry are dropped.
    pub fn to_row(&self, schema: LogSchema) -> String {
        let mut fields = vec![self.timestamp.to_string()];
        match schema {
            LogSchema::Pattern => {
                fields.push(column(self.specific_gravity));
                fields.push(column(self.temperature));
            }
            LogSchema::Model => {
                fields.push(column(self.fermenter_number));
                fields.push(column(self.specific_gravity));
                fields.push(column(self.temperature));
                fields.push(column(self.ph));
            }
        }
        fields.join(",")
    }
}

fn column<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
