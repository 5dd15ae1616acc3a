//! Errors raised by the build pipeline.
//!
//! I/O errors are wrapped in `Arc` so the enums stay cheap to clone and
//! small enough for the `result_large_err` lint.

use std::process::ExitStatus;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while composing the server package.
#[derive(Debug, Error)]
pub enum CompositionError {
    /// The project root has no `content/` directory.
    #[error("'{root}' is not a Ponzu project: missing '{root}/content'")]
    NotAProject {
        /// Project root that was inspected.
        root: Utf8PathBuf,
    },

    /// Two plugins map to the same module identifier.
    #[error("content type '{identifier}' is declared twice: '{first}' and '{second}'")]
    DuplicateContentType {
        /// Shared identifier.
        identifier: String,
        /// First declaring path, in path order.
        first: Utf8PathBuf,
        /// Second declaring path, in path order.
        second: Utf8PathBuf,
    },

    /// A plugin name cannot be used as a Rust module.
    #[error("content plugin '{path}' has unusable name '{identifier}': {reason}")]
    InvalidPluginName {
        /// Plugin source path.
        path: Utf8PathBuf,
        /// Identifier derived from the path.
        identifier: String,
        /// Why the identifier was rejected.
        reason: &'static str,
    },

    /// A path contains bytes that are not UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },

    /// The selected framework source cannot supply the framework crates.
    #[error("framework source '{location}' is unusable: {reason}")]
    UnusableSource {
        /// Path or URL that was selected.
        location: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The package manifest could not be rendered.
    #[error("failed to render the server manifest: {0}")]
    Manifest(#[source] toml::ser::Error),

    /// Reading plugin sources or writing the composed tree failed.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being read or written.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl CompositionError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// Errors raised while compiling the composed package.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The toolchain executable could not be started.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        /// Toolchain executable.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The toolchain ran but reported failure.
    #[error("'{program}' failed with {status}")]
    Toolchain {
        /// Toolchain executable.
        program: String,
        /// Exit status reported by the toolchain.
        status: ExitStatus,
    },

    /// The toolchain succeeded without producing the server binary.
    #[error("build finished but '{path}' was not produced")]
    MissingOutput {
        /// Expected binary location.
        path: Utf8PathBuf,
    },

    /// Installing the binary at the project root failed.
    #[error("failed to install the server at '{path}': {source}")]
    Install {
        /// Destination or temporary path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Errors raised by `ponzu new`.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// The target exists and already has entries.
    #[error("'{path}' already exists and is not empty")]
    NotEmpty {
        /// Target directory.
        path: Utf8PathBuf,
    },

    /// The target exists but is not a directory.
    #[error("'{path}' exists and is not a directory")]
    NotADirectory {
        /// Target path.
        path: Utf8PathBuf,
    },

    /// Creating the project layout failed.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being created.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Errors raised by `ponzu generate`.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The content type name is unusable.
    #[error("invalid content type name '{name}': {reason}")]
    InvalidTypeName {
        /// Offending name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A field argument does not follow `name:kind[:view]`.
    #[error("malformed field '{argument}': {reason}")]
    MalformedField {
        /// Offending argument.
        argument: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The same field name was given twice.
    #[error("field '{name}' is declared more than once")]
    DuplicateField {
        /// Repeated field name.
        name: String,
    },

    /// The working directory has no `content/` folder.
    #[error("'{root}' is not a Ponzu project: missing '{root}/content'")]
    NotAProject {
        /// Project root that was inspected.
        root: Utf8PathBuf,
    },

    /// A plugin file for this type already exists.
    #[error("'{path}' already exists")]
    AlreadyExists {
        /// Existing plugin file.
        path: Utf8PathBuf,
    },

    /// Writing the plugin file failed.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being written.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<std::io::Error>,
    },
}
