//! JSON document store with an owner lock.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use super::errors::StoreError;
use super::lock::StoreLock;
use super::{ConfigStore, STORE_TARGET};

const DOCUMENT: &str = "system.json";
const LOCK: &str = "system.lock";

type Document = BTreeMap<String, String>;

#[derive(Debug)]
enum Access {
    Reader,
    Owner(Mutex<Option<StoreLock>>),
}

/// Key/value store persisted as `<dir>/system.json`.
///
/// An owning handle holds `<dir>/system.lock` until it is closed or dropped.
/// Every read re-reads the document so values written by another process
/// are visible; writes replace the document atomically.
#[derive(Debug)]
pub struct FileStore {
    document: Utf8PathBuf,
    access: Access,
}

impl FileStore {
    /// Opens the store in `dir` for reading and writing.
    ///
    /// # Errors
    ///
    /// Fails when `dir` cannot be created or another live process holds the
    /// lock.
    pub fn open(dir: &Utf8Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
            path: dir.to_path_buf(),
            source: source.into(),
        })?;
        let lock = StoreLock::acquire(&dir.join(LOCK))?;
        Ok(Self {
            document: dir.join(DOCUMENT),
            access: Access::Owner(Mutex::new(Some(lock))),
        })
    }

    /// Opens a read-only view of the store in `dir` without taking the lock.
    #[must_use]
    pub fn reader(dir: &Utf8Path) -> Self {
        Self {
            document: dir.join(DOCUMENT),
            access: Access::Reader,
        }
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        match fs::read_to_string(&self.document) {
            Ok(text) => serde_json::from_str(&text).map_err(|error| StoreError::Corrupt {
                path: self.document.clone(),
                message: error.to_string(),
            }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Document::new()),
            Err(error) => Err(StoreError::io(&self.document, error)),
        }
    }

    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let staging = self.document.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(document).map_err(|error| StoreError::Corrupt {
            path: self.document.clone(),
            message: error.to_string(),
        })?;
        fs::write(&staging, bytes).map_err(|error| StoreError::io(&staging, error))?;
        fs::rename(&staging, &self.document).map_err(|error| StoreError::io(&self.document, error))
    }

    fn owner_lock(&self) -> Result<MutexGuard<'_, Option<StoreLock>>, StoreError> {
        match &self.access {
            Access::Reader => Err(StoreError::ReadOnly),
            Access::Owner(lock) => {
                let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                if guard.is_none() {
                    return Err(StoreError::Closed);
                }
                Ok(guard)
            }
        }
    }
}

impl ConfigStore for FileStore {
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _held = self.owner_lock()?;
        let mut document = self.read_document()?;
        document.insert(key.to_owned(), value.to_owned());
        self.write_document(&document)?;
        debug!(target: STORE_TARGET, key, "stored value");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Access::Owner(lock) = &self.access
            && lock.lock().unwrap_or_else(PoisonError::into_inner).is_none()
        {
            return Err(StoreError::Closed);
        }
        Ok(self.read_document()?.remove(key))
    }

    fn close(&self) -> Result<(), StoreError> {
        if let Access::Owner(lock) = &self.access {
            let released = lock.lock().unwrap_or_else(PoisonError::into_inner).take();
            drop(released);
        }
        Ok(())
    }
}
