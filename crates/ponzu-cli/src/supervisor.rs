//! Runs the built server as a managed child process.
//!
//! The child is spawned once, waited on once and its exit status propagated
//! once. Its stdout and stderr are inherited so server output reaches the
//! operator unbuffered.

use std::ffi::OsStr;
use std::io;
use std::process::{Command, ExitStatus, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use ponzu_config::RunInvocation;
use thiserror::Error;

/// Errors raised while supervising the server process.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The artifact could not be started.
    #[error("failed to start {artifact}: {source}")]
    Spawn {
        /// Artifact that was executed.
        artifact: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Waiting for the child failed.
    #[error("failed to wait for {artifact}: {source}")]
    Wait {
        /// Artifact that was executed.
        artifact: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// The child exited with a status code.
    Code(i32),
    /// The child was terminated by a signal.
    Signal(i32),
}

impl ChildExit {
    fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signal(signal);
            }
        }
        Self::Code(1)
    }

    /// Exit code the CLI should report.
    ///
    /// Codes outside `0..=255` map to 1; a signal `s` maps to `128 + s`.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        let raw = match self {
            Self::Code(code) => code,
            Self::Signal(signal) => signal.saturating_add(128),
        };
        u8::try_from(raw).unwrap_or(1)
    }
}

/// Spawns `artifact` with the serve arguments for `invocation` and waits.
///
/// # Errors
///
/// Returns [`SupervisorError::Spawn`] when the artifact cannot be started and
/// [`SupervisorError::Wait`] when its status cannot be collected.
pub fn run_artifact(
    artifact: &Utf8Path,
    invocation: &RunInvocation,
) -> Result<ChildExit, SupervisorError> {
    run_artifact_with_env(artifact, invocation, std::iter::empty::<(&str, &str)>())
}

/// Like [`run_artifact`], with extra environment variables for the child.
///
/// The argument vector is unchanged; settings that have no place in it, such
/// as the store directory, travel through `environment`.
///
/// # Errors
///
/// As [`run_artifact`].
pub fn run_artifact_with_env<I, K, V>(
    artifact: &Utf8Path,
    invocation: &RunInvocation,
    environment: I,
) -> Result<ChildExit, SupervisorError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut child = Command::new(artifact)
        .args(invocation.arguments())
        .envs(environment)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| SupervisorError::Spawn {
            artifact: artifact.to_path_buf(),
            source,
        })?;
    let status = child.wait().map_err(|source| SupervisorError::Wait {
        artifact: artifact.to_path_buf(),
        source,
    })?;
    Ok(ChildExit::from_status(status))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ChildExit::Code(0), 0)]
    #[case(ChildExit::Code(3), 3)]
    #[case(ChildExit::Code(255), 255)]
    #[case(ChildExit::Code(256), 1)]
    #[case(ChildExit::Code(-1), 1)]
    #[case(ChildExit::Signal(15), 143)]
    fn exit_codes_are_mapped(#[case] exit: ChildExit, #[case] expected: u8) {
        assert_eq!(exit.exit_code(), expected);
    }

    #[test]
    fn missing_artifact_is_a_spawn_error() {
        let invocation = RunInvocation {
            port: 8080,
            https: false,
            services: ponzu_config::ServiceSelection::default(),
        };
        let error = run_artifact(Utf8Path::new("/nonexistent/ponzu-server"), &invocation)
            .expect_err("spawn should fail");
        assert!(matches!(error, SupervisorError::Spawn { .. }));
    }

    #[cfg(unix)]
    mod unix {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        use ponzu_config::ServiceSelection;
        use tempfile::TempDir;

        use super::*;

        fn fake_artifact(dir: &TempDir, body: &str) -> Utf8PathBuf {
            let path = Utf8PathBuf::from_path_buf(dir.path().join("ponzu-server")).expect("utf-8");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write artifact");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
            path
        }

        #[test]
        fn child_exit_code_is_propagated() {
            let dir = TempDir::new().expect("temp dir");
            let artifact = fake_artifact(&dir, "exit 3");
            let invocation = RunInvocation {
                port: 8080,
                https: false,
                services: ServiceSelection::default(),
            };
            let exit = run_artifact(&artifact, &invocation).expect("run");
            assert_eq!(exit, ChildExit::Code(3));
            assert_eq!(exit.exit_code(), 3);
        }

        #[test]
        fn child_receives_the_serve_arguments() {
            let dir = TempDir::new().expect("temp dir");
            let record = dir.path().join("args.txt");
            let artifact = fake_artifact(
                &dir,
                &format!("printf '%s\\n' \"$@\" > '{}'", record.display()),
            );
            let invocation = RunInvocation {
                port: 8080,
                https: true,
                services: ServiceSelection::default(),
            };
            run_artifact(&artifact, &invocation).expect("run");
            let recorded = fs::read_to_string(record).expect("recorded args");
            assert_eq!(recorded, "--port=8080\n--https\nserve\nadmin,api\n");
        }

        #[test]
        fn child_receives_the_handoff_environment() {
            let dir = TempDir::new().expect("temp dir");
            let record = dir.path().join("env.txt");
            let artifact = fake_artifact(
                &dir,
                &format!(
                    "printf '%s %s\\n' \"$PONZU_STORE_DIR\" \"$*\" > '{}'",
                    record.display()
                ),
            );
            let invocation = RunInvocation {
                port: 8080,
                https: false,
                services: ServiceSelection::default(),
            };
            run_artifact_with_env(&artifact, &invocation, [("PONZU_STORE_DIR", "/srv/data")])
                .expect("run");
            let recorded = fs::read_to_string(record).expect("recorded env");
            assert_eq!(
                recorded,
                "/srv/data --port=8080 --https=false serve admin,api\n"
            );
        }

        #[test]
        fn signals_map_above_128() {
            let dir = TempDir::new().expect("temp dir");
            let artifact = fake_artifact(&dir, "kill -TERM $$");
            let invocation = RunInvocation {
                port: 8080,
                https: false,
                services: ServiceSelection::default(),
            };
            let exit = run_artifact(&artifact, &invocation).expect("run");
            assert_eq!(exit, ChildExit::Signal(15));
            assert_eq!(exit.exit_code(), 143);
        }
    }
}
