//! Compilation of a composed package into the `ponzu-server` artifact.

use std::fs;
use std::process::{Command, Stdio};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::compose::ComposedTree;
use crate::error::BuildError;
use crate::{ARTIFACT_NAME, STATE_DIR};

/// The installed server program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Location of the executable.
    pub path: Utf8PathBuf,
}

/// Location of the server artifact for the project at `project_root`.
#[must_use]
pub fn artifact_path(project_root: &Utf8Path) -> Utf8PathBuf {
    project_root.join(format!("{ARTIFACT_NAME}{}", std::env::consts::EXE_SUFFIX))
}

/// Compiles `tree` with `toolchain` and installs the result at the project
/// root.
///
/// The toolchain runs as `<toolchain> build --release --manifest-path
/// <tree>/Cargo.toml --target-dir <root>/.ponzu/target` with inherited
/// output streams. Every call rebuilds; the previous artifact is replaced
/// atomically.
///
/// # Errors
///
/// Returns [`BuildError::Launch`] when the toolchain cannot start,
/// [`BuildError::Toolchain`] when it exits unsuccessfully,
/// [`BuildError::MissingOutput`] when no binary was produced and
/// [`BuildError::Install`] when copying the binary fails.
pub fn build(tree: &ComposedTree, toolchain: &str) -> Result<BuildArtifact, BuildError> {
    let target_dir = tree.project_root().join(STATE_DIR).join("target");
    let manifest_path = tree.manifest_path();

    info!(
        target: "ponzu_build::executor",
        toolchain,
        manifest = %manifest_path,
        "compiling server"
    );
    let status = Command::new(toolchain)
        .arg("build")
        .arg("--release")
        .arg("--manifest-path")
        .arg(manifest_path.as_std_path())
        .arg("--target-dir")
        .arg(target_dir.as_std_path())
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| BuildError::Launch {
            program: toolchain.to_owned(),
            source: Arc::new(source),
        })?;
    if !status.success() {
        return Err(BuildError::Toolchain {
            program: toolchain.to_owned(),
            status,
        });
    }

    let output = target_dir
        .join("release")
        .join(format!("{ARTIFACT_NAME}{}", std::env::consts::EXE_SUFFIX));
    if !output.is_file() {
        return Err(BuildError::MissingOutput { path: output });
    }

    let destination = artifact_path(tree.project_root());
    install(&output, &destination)?;
    info!(
        target: "ponzu_build::executor",
        artifact = %destination,
        "server artifact installed"
    );
    Ok(BuildArtifact { path: destination })
}

fn install(output: &Utf8Path, destination: &Utf8Path) -> Result<(), BuildError> {
    let staging = destination.with_file_name(format!(".{ARTIFACT_NAME}.tmp"));
    fs::copy(output, &staging).map_err(|source| install_error(&staging, source))?;
    debug!(target: "ponzu_build::executor", staging = %staging, "staged artifact");
    fs::rename(&staging, destination).map_err(|source| install_error(destination, source))
}

fn install_error(path: &Utf8Path, source: std::io::Error) -> BuildError {
    BuildError::Install {
        path: path.to_path_buf(),
        source: Arc::new(source),
    }
}
