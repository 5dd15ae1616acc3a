//! Error types for the config handoff store.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while opening, reading or writing the store.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// The store directory could not be created.
    #[error("failed to create store directory {path}: {source}")]
    CreateDir {
        /// Directory being created.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Another live process owns the store.
    #[error("store at {path} is locked by running process {pid}")]
    Locked {
        /// Lock file path.
        path: Utf8PathBuf,
        /// Owner process identifier.
        pid: u32,
    },
    /// The lock file could not be created or removed.
    #[error("failed to manage store lock {path}: {source}")]
    Lock {
        /// Lock file path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<io::Error>,
    },
    /// Checking whether the lock owner is alive failed.
    #[error("failed to check lock owner {pid}: {message}")]
    CheckOwner {
        /// Owner process identifier.
        pid: u32,
        /// Description of the failure.
        message: String,
    },
    /// The store has been closed.
    #[error("store has been closed")]
    Closed,
    /// The handle was opened without the write lock.
    #[error("store handle is read-only")]
    ReadOnly,
    /// Reading or writing the document failed.
    #[error("store I/O failed at {path}: {source}")]
    Io {
        /// Document or temporary path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The document is not valid JSON.
    #[error("store document {path} is corrupt: {message}")]
    Corrupt {
        /// Document path.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },
}

impl StoreError {
    pub(super) fn io(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}
