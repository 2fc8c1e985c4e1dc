//! # Ferment Common Library
//!
//! Shared code for the fermentation log services:
//! - Reading model and CSV row layout
//! - Append-only reading log (file and in-memory sinks)
//! - Configuration loading and credential lookup

pub mod config;
pub mod error;
pub mod log;
pub mod reading;

pub use error::{Error, Result};
pub use log::{CsvLog, MemoryLog, ReadingLog};
pub use reading::{LogSchema, Reading};
