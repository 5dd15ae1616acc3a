//! Exclusive ownership of a store directory.
//!
//! The lock is a file created with `create_new` that records the owner's
//! PID. A lock left behind by a dead process is replaced.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use super::STORE_TARGET;
use super::errors::StoreError;

#[derive(Debug)]
pub(super) struct StoreLock {
    path: Utf8PathBuf,
    _file: File,
}

impl StoreLock {
    pub(super) fn acquire(path: &Utf8Path) -> Result<Self, StoreError> {
        match create(path) {
            Ok(file) => Ok(Self::held(path, file)),
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                replace_stale(path)?;
                let file = create(path).map_err(|source| lock_error(path, source))?;
                Ok(Self::held(path, file))
            }
            Err(source) => Err(lock_error(path, source)),
        }
    }

    fn held(path: &Utf8Path, file: File) -> Self {
        debug!(target: STORE_TARGET, file = %path, "acquired store lock");
        Self {
            path: path.to_path_buf(),
            _file: file,
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => {
                warn!(
                    target: STORE_TARGET,
                    file = %self.path,
                    error = %error,
                    "failed to remove store lock"
                );
            }
            _ => debug!(target: STORE_TARGET, file = %self.path, "released store lock"),
        }
    }
}

fn create(path: &Utf8Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    writeln!(file, "{}", std::process::id())?;
    file.sync_all()?;
    Ok(file)
}

fn replace_stale(path: &Utf8Path) -> Result<(), StoreError> {
    if let Some(pid) = read_pid(path)
        && pid != 0
    {
        if owner_alive(pid)? {
            return Err(StoreError::Locked {
                path: path.to_path_buf(),
                pid,
            });
        }
        info!(
            target: STORE_TARGET,
            pid,
            file = %path,
            "store lock owner is gone; replacing stale lock"
        );
    }
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(lock_error(path, source)),
    }
}

fn read_pid(path: &Utf8Path) -> Option<u32> {
    let content = fs::read_to_string(path).ok()?;
    content.trim().parse::<u32>().ok()
}

#[cfg(unix)]
fn owner_alive(pid: u32) -> Result<bool, StoreError> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return Ok(false);
    };
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(errno) => Err(StoreError::CheckOwner {
            pid,
            message: errno.desc().to_owned(),
        }),
    }
}

#[cfg(not(unix))]
fn owner_alive(pid: u32) -> Result<bool, StoreError> {
    Ok(pid == std::process::id())
}

fn lock_error(path: &Utf8Path, source: io::Error) -> StoreError {
    StoreError::Lock {
        path: path.to_path_buf(),
        source: Arc::new(source),
    }
}
