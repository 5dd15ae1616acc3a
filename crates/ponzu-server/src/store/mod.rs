//! Config handoff store.
//!
//! The serving process writes values such as its listening port here so that
//! other components, and other processes, can discover them without a
//! side channel. [`FileStore`] keeps the values in a JSON document guarded by
//! an owner lock.

mod errors;
mod file;
mod lock;

use std::sync::Arc;

use ponzu_config::Config;
use tracing::warn;

pub use self::errors::StoreError;
pub use self::file::FileStore;

const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// Key under which the active listening port is recorded.
pub const HTTP_PORT_KEY: &str = "http_port";

/// Persistent key/value store shared across process boundaries.
pub trait ConfigStore: Send + Sync {
    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Fails when the store is closed, read-only or cannot be written.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Fails when the store is closed or its document cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Releases the store. Later writes fail.
    ///
    /// # Errors
    ///
    /// Fails when releasing underlying resources fails.
    fn close(&self) -> Result<(), StoreError>;
}

/// Opens the store during bootstrap.
pub trait StoreOpener: Send + Sync {
    /// Opens the store for exclusive use by this process.
    ///
    /// # Errors
    ///
    /// Returns the reason the store could not be opened.
    fn open(&self, config: &Config) -> Result<Arc<dyn ConfigStore>, StoreError>;
}

/// Opens a [`FileStore`] in the configured store directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStoreOpener;

impl StoreOpener for FileStoreOpener {
    fn open(&self, config: &Config) -> Result<Arc<dyn ConfigStore>, StoreError> {
        Ok(Arc::new(FileStore::open(config.store_dir())?))
    }
}

/// Closes the wrapped store when dropped.
pub(crate) struct StoreGuard {
    store: Arc<dyn ConfigStore>,
}

impl StoreGuard {
    pub(crate) fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }
}

impl Drop for StoreGuard {
    fn drop(&mut self) {
        if let Err(error) = self.store.close() {
            warn!(target: STORE_TARGET, error = %error, "failed to close store");
        }
    }
}
