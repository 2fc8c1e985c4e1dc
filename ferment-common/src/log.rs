//! Append-only reading log
//!
//! The log is constructed once at startup and handed to the recorder, so
//! tests can swap the file-backed [`CsvLog`] for a [`MemoryLog`].
//!
//! Rows are appended in arrival order and never rewritten. The header is
//! written only when the log is first created.

use crate::reading::LogSchema;
use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Destination for formatted reading rows
pub trait ReadingLog: Send + Sync {
    /// Column layout this log was initialized with
    fn schema(&self) -> LogSchema;

    /// Append one complete row; `row` carries no line terminator
    fn append(&self, row: &str) -> Result<()>;
}

/// Comma-separated reading log on disk
pub struct CsvLog {
    path: PathBuf,
    schema: LogSchema,
    file: Mutex<File>,
}

impl CsvLog {
    /// Open the log at `path`, creating it with a header row if missing
    ///
    /// An existing non-empty file is never modified here. If its first line
    /// does not match the expected header a warning is logged and appends
    /// continue. An existing empty file counts as uninitialized and gets the
    /// header.
    pub fn open(path: impl Into<PathBuf>, schema: LogSchema) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                info!("Created log directory: {}", parent.display());
            }
        }

        let header = schema.header();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(e) = write_header(&mut file, &header) {
                    // Leave no headerless file behind for the next start
                    drop(file);
                    if let Err(remove_err) = fs::remove_file(&path) {
                        warn!(
                            "Could not remove partial reading log {}: {}",
                            path.display(),
                            remove_err
                        );
                    }
                    return Err(Error::Io(e));
                }
                info!("Created reading log {} ({})", path.display(), header);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if fs::metadata(&path)?.len() == 0 {
                    let mut file = OpenOptions::new().append(true).open(&path)?;
                    write_header(&mut file, &header)?;
                    info!("Initialized empty reading log {} ({})", path.display(), header);
                } else {
                    let existing = first_line(&path)?;
                    if existing.as_deref() != Some(header.as_str()) {
                        warn!(
                            "Reading log {} has header {:?}, expected {:?}",
                            path.display(),
                            existing.unwrap_or_default(),
                            header
                        );
                    }
                }
            }
            Err(e) => return Err(Error::Io(e)),
        }

        let file = OpenOptions::new().append(true).open(&path)?;

        Ok(Self {
            path,
            schema,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back all data rows (header excluded)
    pub fn read_rows(&self) -> Result<Vec<String>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut rows = Vec::new();
        for line in reader.lines().skip(1) {
            let line = line?;
            if !line.is_empty() {
                rows.push(line);
            }
        }
        Ok(rows)
    }
}

impl ReadingLog for CsvLog {
    fn schema(&self) -> LogSchema {
        self.schema
    }

    fn append(&self, row: &str) -> Result<()> {
        let line = format!("{}\n", row);
        let mut file = self
            .file
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("reading log lock poisoned")))?;
        // One write per row so concurrent appends never interleave
        file.write_all(line.as_bytes())?;
        file.flush()?;
        debug!("Appended row to {}: {}", self.path.display(), row);
        Ok(())
    }
}

fn write_header(file: &mut File, header: &str) -> std::io::Result<()> {
    file.write_all(format!("{}\n", header).as_bytes())?;
    file.flush()
}

fn first_line(path: &Path) -> Result<Option<String>> {
    let reader = BufReader::new(File::open(path)?);
    match reader.lines().next() {
        Some(line) => Ok(Some(line?)),
        None => Ok(None),
    }
}

/// In-memory reading log
///
/// Behaves like a freshly created [`CsvLog`]: the header is recorded once
/// at construction and rows accumulate in order.
pub struct MemoryLog {
    schema: LogSchema,
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new(schema: LogSchema) -> Self {
        Self {
            schema,
            lines: Mutex::new(vec![schema.header()]),
        }
    }

    /// Data rows appended so far (header excluded)
    pub fn rows(&self) -> Vec<String> {
        // A poisoned sink still reports what it holds
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.iter().skip(1).cloned().collect()
    }

    /// Full contents as they would appear on disk
    pub fn contents(&self) -> String {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.iter().map(|l| format!("{}\n", l)).collect()
    }
}

impl ReadingLog for MemoryLog {
    fn schema(&self) -> LogSchema {
        self.schema
    }

    fn append(&self, row: &str) -> Result<()> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("memory log lock poisoned")))?;
        lines.push(row.to_string());
        Ok(())
    }
}
