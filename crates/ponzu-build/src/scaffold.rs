//! Project scaffolding for `ponzu new`.

use std::fs;
use std::sync::Arc;

use camino::Utf8Path;
use tracing::info;

use crate::error::ScaffoldError;
use crate::{ARTIFACT_NAME, CONTENT_DIR, STATE_DIR};

/// Creates a new project at `dir`.
///
/// The directory may already exist as long as it is empty. The project gets
/// an empty `content/` folder and a `.gitignore` excluding the artifact and
/// generated state.
///
/// # Errors
///
/// Fails when `dir` is a file, is a non-empty directory, or cannot be
/// created.
pub fn scaffold(dir: &Utf8Path) -> Result<(), ScaffoldError> {
    let io_error = |path: &Utf8Path, source| ScaffoldError::Io {
        path: path.to_path_buf(),
        source: Arc::new(source),
    };
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ScaffoldError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        let mut entries = fs::read_dir(dir).map_err(|err| io_error(dir, err))?;
        if entries.next().is_some() {
            return Err(ScaffoldError::NotEmpty {
                path: dir.to_path_buf(),
            });
        }
    }

    let content = dir.join(CONTENT_DIR);
    fs::create_dir_all(&content).map_err(|err| io_error(&content, err))?;
    let gitignore = dir.join(".gitignore");
    fs::write(&gitignore, format!("/{ARTIFACT_NAME}\n/{STATE_DIR}/\n"))
        .map_err(|err| io_error(&gitignore, err))?;

    info!(target: "ponzu_build::scaffold", project = %dir, "created project");
    Ok(())
}
