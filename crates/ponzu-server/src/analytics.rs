//! Request analytics collector.
//!
//! [`RequestLog`] appends one JSON object per handled request to
//! `<store_dir>/analytics.jsonl`. Each line is flushed as soon as it is
//! written, so a server that is killed loses no records.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::sync::{Arc, Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use ponzu_config::Config;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

const ANALYTICS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::analytics");

/// File name of the request log inside the store directory.
pub const ANALYTICS_FILE: &str = "analytics.jsonl";

/// Errors raised by the analytics collector.
#[derive(Debug, Error, Clone)]
pub enum AnalyticsError {
    /// The log file could not be opened.
    #[error("failed to open analytics log {path}: {source}")]
    Open {
        /// Log path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Writing or flushing a record failed.
    #[error("failed to write analytics record: {source}")]
    Write {
        /// Underlying error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The collector has been closed.
    #[error("analytics collector has been closed")]
    Closed,
}

/// A single handled request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestRecord {
    /// RFC 3339 UTC time the response was produced.
    pub timestamp: String,
    /// Request method.
    pub method: String,
    /// Request path without query string.
    pub path: String,
    /// Response status code.
    pub status: u16,
}

impl RequestRecord {
    /// Builds a record stamped with the current time.
    #[must_use]
    pub fn now(method: &str, path: &str, status: u16) -> Self {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        Self {
            timestamp,
            method: method.to_owned(),
            path: path.to_owned(),
            status,
        }
    }
}

/// Sink for request records.
pub trait AnalyticsCollector: Send + Sync {
    /// Records a handled request.
    ///
    /// # Errors
    ///
    /// Fails when the collector is closed or the record cannot be written.
    fn record(&self, record: &RequestRecord) -> Result<(), AnalyticsError>;

    /// Flushes and releases the collector. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Fails when buffered records cannot be flushed.
    fn close(&self) -> Result<(), AnalyticsError>;
}

/// Opens the collector during bootstrap.
pub trait AnalyticsOpener: Send + Sync {
    /// Opens the collector.
    ///
    /// # Errors
    ///
    /// Returns the reason the collector could not be opened.
    fn open(&self, config: &Config) -> Result<Arc<dyn AnalyticsCollector>, AnalyticsError>;
}

/// Opens a [`RequestLog`] in the configured store directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogOpener;

impl AnalyticsOpener for RequestLogOpener {
    fn open(&self, config: &Config) -> Result<Arc<dyn AnalyticsCollector>, AnalyticsError> {
        Ok(Arc::new(RequestLog::open(config.store_dir())?))
    }
}

/// Append-only JSON Lines request log.
#[derive(Debug)]
pub struct RequestLog {
    writer: Mutex<Option<BufWriter<File>>>,
}

impl RequestLog {
    /// Opens (or creates) `<dir>/analytics.jsonl` for appending.
    ///
    /// # Errors
    ///
    /// Fails when the directory or file cannot be created.
    pub fn open(dir: &Utf8Path) -> Result<Self, AnalyticsError> {
        let path = dir.join(ANALYTICS_FILE);
        let open_error = |source: io::Error| AnalyticsError::Open {
            path: path.clone(),
            source: Arc::new(source),
        };
        fs::create_dir_all(dir).map_err(open_error)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_error)?;
        Ok(Self {
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }
}

impl AnalyticsCollector for RequestLog {
    fn record(&self, record: &RequestRecord) -> Result<(), AnalyticsError> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let writer = guard.as_mut().ok_or(AnalyticsError::Closed)?;
        let write_error = |source: io::Error| AnalyticsError::Write {
            source: Arc::new(source),
        };
        serde_json::to_writer(&mut *writer, record)
            .map_err(|error| write_error(io::Error::other(error)))?;
        writer.write_all(b"\n").map_err(write_error)?;
        writer.flush().map_err(write_error)
    }

    fn close(&self) -> Result<(), AnalyticsError> {
        let taken = self.writer.lock().unwrap_or_else(PoisonError::into_inner).take();
        match taken {
            Some(mut writer) => writer.flush().map_err(|source| AnalyticsError::Write {
                source: Arc::new(source),
            }),
            None => Ok(()),
        }
    }
}

/// Closes the wrapped collector when dropped.
pub(crate) struct AnalyticsGuard {
    collector: Arc<dyn AnalyticsCollector>,
}

impl AnalyticsGuard {
    pub(crate) fn new(collector: Arc<dyn AnalyticsCollector>) -> Self {
        Self { collector }
    }

    pub(crate) fn collector(&self) -> &Arc<dyn AnalyticsCollector> {
        &self.collector
    }
}

impl Drop for AnalyticsGuard {
    fn drop(&mut self) {
        if let Err(error) = self.collector.close() {
            warn!(target: ANALYTICS_TARGET, error = %error, "failed to close analytics");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;

    fn temp_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8");
        (dir, path)
    }

    #[test]
    fn records_are_appended_as_json_lines() {
        let (_dir, path) = temp_dir();
        let log = RequestLog::open(&path).expect("open");
        log.record(&RequestRecord::now("GET", "/api/types", 200))
            .expect("record");
        log.record(&RequestRecord::now("GET", "/missing", 404))
            .expect("record");
        log.close().expect("close");

        let contents = fs::read_to_string(path.join(ANALYTICS_FILE)).expect("read");
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        let last = lines.last().expect("last line");
        assert_eq!(last["path"], "/missing");
        assert_eq!(last["status"], 404);
        assert!(last["timestamp"].as_str().is_some_and(|ts| ts.ends_with('Z')));
    }

    #[test]
    fn records_reach_the_file_before_close() {
        let (_dir, path) = temp_dir();
        let log = RequestLog::open(&path).expect("open");
        for _ in 0..20 {
            log.record(&RequestRecord::now("GET", "/api/types", 200))
                .expect("record");
        }

        let contents = fs::read_to_string(path.join(ANALYTICS_FILE)).expect("read");
        assert_eq!(contents.lines().count(), 20);
        log.close().expect("close");
    }

    #[test]
    fn close_is_idempotent_and_rejects_later_records() {
        let (_dir, path) = temp_dir();
        let log = RequestLog::open(&path).expect("open");
        log.close().expect("first close");
        log.close().expect("second close");
        let error = log
            .record(&RequestRecord::now("GET", "/", 200))
            .expect_err("closed");
        assert!(matches!(error, AnalyticsError::Closed));
    }
}
