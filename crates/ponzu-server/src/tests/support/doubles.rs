//! Failing collaborators used to exercise bootstrap error paths.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ponzu_config::Config;

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsOpener};
use crate::store::{ConfigStore, FileStore, StoreError, StoreOpener};

/// Analytics opener that always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingAnalyticsOpener;

impl AnalyticsOpener for FailingAnalyticsOpener {
    fn open(&self, _config: &Config) -> Result<Arc<dyn AnalyticsCollector>, AnalyticsError> {
        Err(AnalyticsError::Open {
            path: Utf8PathBuf::from("analytics.jsonl"),
            source: Arc::new(io::Error::other("deliberate failure")),
        })
    }
}

/// Store opener that hands out read-only views, so persisting the port fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadOnlyStoreOpener;

impl StoreOpener for ReadOnlyStoreOpener {
    fn open(&self, config: &Config) -> Result<Arc<dyn ConfigStore>, StoreError> {
        Ok(Arc::new(FileStore::reader(config.store_dir())))
    }
}
