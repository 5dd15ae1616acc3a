//! Shared harness for the CLI runtime tests.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use ponzu_config::Config;
use tempfile::TempDir;

use crate::{AppError, ConfigLoader, IoStreams, run_in_project};

/// Loader that returns a fixed configuration and records its arguments.
#[derive(Debug, Default)]
pub struct TestConfigLoader {
    config: Config,
    seen: RefCell<Option<Vec<OsString>>>,
}

impl TestConfigLoader {
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            seen: RefCell::new(None),
        }
    }

    /// Arguments passed to the last load, if any.
    pub fn seen(&self) -> Option<Vec<OsString>> {
        self.seen.borrow().clone()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        *self.seen.borrow_mut() = Some(args.to_vec());
        Ok(self.config.clone())
    }
}

/// Captured result of one CLI invocation.
#[derive(Debug)]
pub struct Outcome {
    pub exit: ExitCode,
    pub stdout: String,
    pub stderr: String,
}

/// Temporary project directory plus the loader used for each invocation.
pub struct Harness {
    dir: TempDir,
    pub loader: TestConfigLoader,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
            loader: TestConfigLoader::with_config(config),
        }
    }

    pub fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()).expect("utf-8 temp dir")
    }

    pub fn write(&self, relative: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Writes an executable shell script as the project's artifact.
    #[cfg(unix)]
    pub fn fake_artifact(&self, body: &str) -> Utf8PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write("ponzu-server", &format!("#!/bin/sh\n{body}\n"));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    pub fn run(&self, args: &[&str]) -> Outcome {
        self.run_at(self.root(), args)
    }

    /// Runs the CLI with `root` as the project directory.
    pub fn run_at(&self, root: Utf8PathBuf, args: &[&str]) -> Outcome {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let args = std::iter::once("ponzu")
            .chain(args.iter().copied())
            .map(OsString::from);
        let exit = {
            let mut io = IoStreams::new(&mut stdout, &mut stderr);
            run_in_project(args, &mut io, &self.loader, root)
        };
        Outcome {
            exit,
            stdout: String::from_utf8(stdout).expect("stdout utf-8"),
            stderr: String::from_utf8(stderr).expect("stderr utf-8"),
        }
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root().join(relative).exists()
    }

    pub fn read(&self, relative: impl AsRef<Utf8Path>) -> String {
        fs::read_to_string(self.root().join(relative)).expect("read file")
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
